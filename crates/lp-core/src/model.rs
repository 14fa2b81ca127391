//! Layer data model.
//!
//! A layer is one raster element composited over the document. It displays
//! the `src` window of its backing buffer stretched into `dest`:
//!
//! - `src` is a non-destructive crop and always lies inside `pixels`.
//! - `dest` is the on-document placement, at least 1×1.
//! - `z` is an explicit stacking key; ties fall back to insertion order.

use crate::geom::IRect;
use crate::id::LayerId;
use crate::raster::Raster;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ─── Metadata ────────────────────────────────────────────────────────────

/// Attributes of a text layer, kept so the text can be re-rasterized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMeta {
    pub text: String,
    pub size: f32,
    /// `#RRGGBB`
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub font: String,
}

impl Default for TextMeta {
    fn default() -> Self {
        Self {
            text: "Text".to_string(),
            size: 48.0,
            color: "#ffffff".to_string(),
            bold: false,
            italic: false,
            font: "Arial".to_string(),
        }
    }
}

/// Optional typed payload on a layer. Image layers carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerMeta {
    Text(TextMeta),
}

impl LayerMeta {
    pub fn as_text(&self) -> Option<&TextMeta> {
        match self {
            LayerMeta::Text(t) => Some(t),
        }
    }
}

// ─── Layer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub pixels: Arc<Raster>,
    /// Crop window into `pixels`.
    pub src: IRect,
    /// Placement on the document.
    pub dest: IRect,
    pub z: i32,
    pub meta: Option<LayerMeta>,
}

impl Layer {
    /// A layer showing all of `pixels`, unscaled, with its top-left at `(x, y)`.
    pub fn new(id: LayerId, pixels: Arc<Raster>, x: i32, y: i32) -> Self {
        let full = pixels.bounds();
        Self {
            id,
            pixels,
            src: full,
            dest: IRect::new(x, y, full.w.max(1), full.h.max(1)),
            z: 0,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: LayerMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self.meta, Some(LayerMeta::Text(_)))
    }

    /// Display-to-source ratios `(dest.w / src.w, dest.h / src.h)`.
    pub fn scale_factors(&self) -> (f64, f64) {
        (
            self.dest.w as f64 / self.src.w.max(1) as f64,
            self.dest.h as f64 / self.src.h.max(1) as f64,
        )
    }

    /// Clamp `src` into the backing buffer and `dest` to at least 1×1.
    pub fn normalize(&mut self) {
        let bw = self.pixels.width().max(1) as i32;
        let bh = self.pixels.height().max(1) as i32;
        self.src.x = self.src.x.clamp(0, bw - 1);
        self.src.y = self.src.y.clamp(0, bh - 1);
        self.src.w = self.src.w.clamp(1, bw - self.src.x);
        self.src.h = self.src.h.clamp(1, bh - self.src.y);
        self.dest.w = self.dest.w.max(1);
        self.dest.h = self.dest.h.max(1);
    }

    /// The pixels currently visible through the crop window, unscaled.
    pub fn baked(&self) -> Raster {
        self.pixels.sub_image(self.src)
    }

    /// Replace the content with `pixels`, showing all of it.
    pub fn set_pixels(&mut self, pixels: Raster) {
        self.src = pixels.bounds();
        self.pixels = Arc::new(pixels);
    }

    /// Copy every field except the id from `other`.
    pub fn assign_state(&mut self, other: &Layer) {
        self.pixels = Arc::clone(&other.pixels);
        self.src = other.src;
        self.dest = other.dest;
        self.z = other.z;
        self.meta = other.meta.clone();
    }

    /// Equal geometry, stacking, metadata, and pixel content.
    pub fn same_state_as(&self, other: &Layer) -> bool {
        self.id == other.id
            && self.src == other.src
            && self.dest == other.dest
            && self.z == other.z
            && self.meta == other.meta
            && (Arc::ptr_eq(&self.pixels, &other.pixels) || *self.pixels == *other.pixels)
    }
}

/// Indices of `layers` in paint order: stable sort on `z` ascending, ties
/// kept in array order. Recomputed on every call.
pub fn draw_order(layers: &[Layer]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..layers.len()).collect();
    order.sort_by_key(|&i| layers[i].z);
    order
}
