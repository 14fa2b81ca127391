pub mod config;
pub mod geom;
pub mod id;
pub mod model;
pub mod persist;
pub mod raster;
pub mod size;
pub mod viewport;

pub use config::{EditorConfig, MAX_DOC_SIDE, MIN_DOC_SIDE};
pub use geom::{Handle, IRect, clamp_f, clamp_int, handle_points, round_px};
pub use id::{IdGen, LayerId};
pub use model::{Layer, LayerMeta, TextMeta, draw_order};
pub use persist::{LayerRecord, MemoryStore, PersistError, SessionState, SessionStore};
pub use raster::{Raster, Rotation};
pub use size::parse_size;
pub use viewport::{ViewState, Viewport};

// Re-export kurbo's point so downstream crates agree on one coordinate type
pub use kurbo::Point;
