//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and pen events into a unified `InputEvent`
//! consumed by the editor session. Coordinates are canvas (device) pixels.

/// Which button pressed the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    /// Middle button: always pans.
    Middle,
    Secondary,
}

/// Pointing device class. Touch enlarges the handle hit radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// A normalized input event from any pointing device or the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        kind: PointerKind,
    },

    PointerMove { x: f64, y: f64 },

    PointerUp { x: f64, y: f64 },

    /// The platform took the pointer away. Finalizes like `PointerUp`.
    PointerCancel,

    /// Wheel or trackpad scroll. With `ctrl` it zooms at `(x, y)`.
    Wheel {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
        ctrl: bool,
    },

    /// Two-finger pinch. `factor` is the distance ratio since the last event.
    Pinch { cx: f64, cy: f64, factor: f64 },

    /// Key pressed.
    Key {
        key: String,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    },

    /// Key released. Only used to end a held pan.
    KeyUp { key: String },
}

impl InputEvent {
    /// Primary-button mouse press.
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            kind: PointerKind::Mouse,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }

    /// A key press with no modifiers.
    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::Wheel { x, y, .. } => Some((*x, *y)),
            Self::Pinch { cx, cy, .. } => Some((*cx, *cy)),
            _ => None,
        }
    }
}
