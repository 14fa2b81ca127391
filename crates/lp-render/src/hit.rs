//! Hit testing: point → layer / handle lookup.
//!
//! Walks the draw order back to front so the last-painted layer wins.

use kurbo::Point;
use lp_core::geom::{Handle, IRect, handle_points};
use lp_core::id::LayerId;
use lp_core::model::{Layer, draw_order};

/// Find the topmost layer whose dest rect contains `pt` (document units).
/// Returns `None` over bare document.
pub fn hit_test(layers: &[Layer], pt: Point) -> Option<LayerId> {
    // Reverse draw order: topmost first
    draw_order(layers)
        .into_iter()
        .rev()
        .map(|i| &layers[i])
        .find(|layer| layer.dest.contains(pt))
        .map(|layer| layer.id)
}

/// Find the handle of `rect` within `radius` of `pt` on both axes.
/// Corners are tested before edge midpoints.
pub fn hit_handle(rect: &IRect, pt: Point, radius: f64) -> Option<Handle> {
    handle_points(rect)
        .into_iter()
        .find(|(_, hp)| (pt.x - hp.x).abs() <= radius && (pt.y - hp.y).abs() <= radius)
        .map(|(handle, _)| handle)
}
