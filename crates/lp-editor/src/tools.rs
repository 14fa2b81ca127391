//! Tools and gesture ownership.
//!
//! A pointer gesture is owned by exactly one [`Gesture`] from pointer-down
//! until pointer-up or cancel. Claim order on pointer-down:
//!
//! | Priority | Claimed when | Gesture |
//! |----------|--------------|---------|
//! | 1 | crop tool active and marquee shown | `Crop` |
//! | 2 | space held or middle button | `Pan` |
//! | 3 | select mode | none (toggles multi-select) |
//! | 4 | not brushing and a layer or handle is hit | `Layer` |
//! | 5 | brush tool | `Stroke` |

use kurbo::Point;
use lp_core::id::LayerId;
use lp_core::model::Layer;
use lp_core::raster::Raster;
use std::sync::Arc;

/// The active tool determines how pointer-down is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    /// Move / resize / crop layers.
    #[default]
    Objects,
    Brush,
    Crop,
    /// Click toggles layers in and out of the multi-selection.
    Select,
}

/// Where a brush stroke lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeTarget {
    Document,
    Layer(LayerId),
}

/// The single owner of the current pointer gesture.
#[derive(Debug, Clone)]
pub enum Gesture {
    /// Dragging the crop marquee (mode lives on the marquee).
    Crop,
    /// Panning. Replayed from the translation at gesture start.
    Pan {
        start: Point,
        tx0: f64,
        ty0: f64,
    },
    /// Moving or resizing a layer; `before` is the layer at pointer-down.
    Layer { before: Layer },
    /// Painting. `before` holds the target layer's state when the target
    /// is a layer; document strokes snapshot on release instead.
    Stroke {
        target: StrokeTarget,
        before: Option<Layer>,
        /// Last point in document coordinates.
        last: Point,
    },
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Crop => "crop",
            Gesture::Pan { .. } => "pan",
            Gesture::Layer { .. } => "layer",
            Gesture::Stroke { .. } => "stroke",
        }
    }
}

/// True when a stroke left the document pixels untouched.
pub(crate) fn document_unchanged(before: &Arc<Raster>, now: &Arc<Raster>) -> bool {
    Arc::ptr_eq(before, now) || **before == **now
}
