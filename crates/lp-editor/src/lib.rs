pub mod brush;
pub mod crop;
pub mod filters;
pub mod history;
pub mod input;
pub mod scene;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use brush::{Brush, RoundBrush};
pub use crop::{CropMarquee, CropMode};
pub use filters::{Adjustments, PixelFilter};
pub use history::{EditHistory, LayerAction, LayerHistory, RasterHistory, UndoOutcome};
pub use input::{InputEvent, PointerButton, PointerKind};
pub use scene::{DragKind, SceneModel};
pub use session::{Editor, TextRasterizer};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{Gesture, StrokeTarget, ToolKind};
