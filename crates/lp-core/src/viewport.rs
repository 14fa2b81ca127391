//! Pan/zoom mapping between canvas (device) and document coordinates.
//!
//! `canvas = doc * scale + (tx, ty)`. Inputs are never rejected: zoom is
//! clamped to `[min_scale, max_scale]` and translation is clamped so the
//! document cannot be panned out of view.

use crate::geom::{clamp_f, round_px};
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

/// The persisted part of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    // Extents used only for clamping.
    doc_w: f64,
    doc_h: f64,
    view_w: f64,
    view_h: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.1, 10.0)
    }
}

impl Viewport {
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
            min_scale,
            max_scale,
            doc_w: 0.0,
            doc_h: 0.0,
            view_w: 0.0,
            view_h: 0.0,
        }
    }

    /// Scale 1, document centered in the view, then clamped.
    pub fn reset(&mut self, doc_w: u32, doc_h: u32, view_w: u32, view_h: u32) {
        self.doc_w = doc_w as f64;
        self.doc_h = doc_h as f64;
        self.view_w = view_w as f64;
        self.view_h = view_h as f64;
        self.scale = 1.0;
        self.tx = ((self.view_w - self.doc_w) / 2.0).floor();
        self.ty = ((self.view_h - self.doc_h) / 2.0).floor();
        self.clamp();
    }

    pub fn set_view_size(&mut self, view_w: u32, view_h: u32) {
        self.view_w = view_w as f64;
        self.view_h = view_h as f64;
        self.clamp();
    }

    pub fn view_size(&self) -> (f64, f64) {
        (self.view_w, self.view_h)
    }

    /// Zoom by `factor` keeping the document point under `(cx, cy)` fixed.
    /// No-op when the clamped scale is unchanged.
    pub fn zoom_at(&mut self, factor: f64, cx: f64, cy: f64) {
        let prev = self.scale;
        let next = clamp_f(prev * factor, self.min_scale, self.max_scale);
        if next == prev || !next.is_finite() {
            return;
        }
        let k = next / prev;
        self.tx = cx - k * (cx - self.tx);
        self.ty = cy - k * (cy - self.ty);
        self.scale = next;
        self.clamp();
        log::trace!("zoom {prev:.3} -> {next:.3} at ({cx}, {cy})");
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.tx += dx;
        self.ty += dy;
        self.clamp();
    }

    /// Set translation directly (then clamp). Used to replay a pan from its
    /// starting translation.
    pub fn set_translation(&mut self, tx: f64, ty: f64) {
        self.tx = tx;
        self.ty = ty;
        self.clamp();
    }

    pub fn canvas_to_image(&self, pt: Point) -> Point {
        Point::new((pt.x - self.tx) / self.scale, (pt.y - self.ty) / self.scale)
    }

    pub fn image_to_canvas(&self, pt: Point) -> Point {
        Point::new(pt.x * self.scale + self.tx, pt.y * self.scale + self.ty)
    }

    /// Document → canvas transform.
    pub fn transform(&self) -> Affine {
        Affine::new([self.scale, 0.0, 0.0, self.scale, self.tx, self.ty])
    }

    /// Keep the scaled document anchored: centered on an axis where it is
    /// smaller than the view, otherwise unable to leave blank space past
    /// either edge.
    pub fn clamp(&mut self) {
        self.tx = clamp_axis(self.tx, self.doc_w * self.scale, self.view_w);
        self.ty = clamp_axis(self.ty, self.doc_h * self.scale, self.view_h);
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            scale: self.scale,
            tx: self.tx,
            ty: self.ty,
        }
    }

    /// Restore a persisted view. The scale is brought back into range and a
    /// non-finite or non-positive scale falls back to 1.
    pub fn restore(&mut self, view: ViewState) {
        self.scale = if view.scale.is_finite() && view.scale > 0.0 {
            clamp_f(view.scale, self.min_scale, self.max_scale)
        } else {
            1.0
        };
        self.tx = if view.tx.is_finite() { view.tx } else { 0.0 };
        self.ty = if view.ty.is_finite() { view.ty } else { 0.0 };
        self.clamp();
    }
}

fn clamp_axis(t: f64, content: f64, view: f64) -> f64 {
    if content <= view {
        round_px((view - content) / 2.0) as f64
    } else {
        let min_t = round_px(view - content) as f64;
        t.clamp(min_t, 0.0)
    }
}
