//! Scene model: the layer collection, selection, and the interactive
//! transform state machine.
//!
//! A drag captures the layer's geometry at pointer-down and every
//! `update_interaction` recomputes from that origin, so dropped or repeated
//! move events cannot drift the result.
//!
//! | Handle | Effect |
//! |--------|--------|
//! | body | move `dest` |
//! | corner | resize `dest`, aspect-locked about the opposite corner |
//! | edge | crop `src` inward, `dest` shrinks by the same on-screen amount |

use kurbo::Point;
use lp_core::geom::{Handle, IRect, clamp_int, round_px};
use lp_core::id::{IdGen, LayerId};
use lp_core::model::{Layer, draw_order};
use lp_core::raster::Raster;
use lp_render::hit::{hit_handle, hit_test};
use smallvec::SmallVec;
use std::sync::Arc;

/// What the current layer drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize(Handle),
}

#[derive(Debug, Clone)]
struct DragState {
    id: LayerId,
    kind: DragKind,
    start: Point,
    origin_dest: IRect,
    origin_src: IRect,
    /// `dest / src` ratios at drag start.
    scale_x: f64,
    scale_y: f64,
}

#[derive(Debug, Clone)]
pub struct SceneModel {
    layers: Vec<Layer>,
    ids: IdGen,
    selected: Option<LayerId>,
    multi: SmallVec<[LayerId; 8]>,
    drag: Option<DragState>,
    /// Handle hit radius in document units.
    pub handle_radius: f64,
    /// Aspect-lock corner handles.
    pub keep_aspect: bool,
}

impl Default for SceneModel {
    fn default() -> Self {
        Self::new(30.0, true)
    }
}

impl SceneModel {
    pub fn new(handle_radius: f64, keep_aspect: bool) -> Self {
        Self {
            layers: Vec::new(),
            ids: IdGen::new(),
            selected: None,
            multi: SmallVec::new(),
            drag: None,
            handle_radius,
            keep_aspect,
        }
    }

    // ─── Collection ──────────────────────────────────────────────────────

    /// Layers in array (insertion) order. Paint with [`draw_order`](Self::draw_order).
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Allocate an id without inserting anything.
    pub fn next_id(&mut self) -> LayerId {
        self.ids.next_id()
    }

    /// The id the next allocation will return.
    pub fn peek_id(&self) -> LayerId {
        self.ids.peek()
    }

    /// Wrap `pixels` in a new layer at `(x, y)`, append it, and select it.
    pub fn add_layer(&mut self, pixels: Raster, x: i32, y: i32) -> LayerId {
        let id = self.ids.next_id();
        self.layers.push(Layer::new(id, Arc::new(pixels), x, y));
        self.selected = Some(id);
        log::debug!("add layer {id} at ({x}, {y})");
        id
    }

    /// Append a layer that already has an id (history, load, duplicate)
    /// and select it.
    pub fn insert_layer(&mut self, layer: Layer) -> LayerId {
        let at = self.layers.len();
        self.insert_layer_at(at, layer)
    }

    /// Insert at `index` (clamped to the end) and select it.
    pub fn insert_layer_at(&mut self, index: usize, mut layer: Layer) -> LayerId {
        layer.normalize();
        let id = layer.id;
        self.ids.observe(id);
        if self.index_of(id).is_some() {
            log::warn!("layer {id} already present, replacing its state");
            self.restore_state(id, &layer);
        } else {
            let index = index.min(self.layers.len());
            self.layers.insert(index, layer);
        }
        self.selected = Some(id);
        id
    }

    /// Remove a layer, returning its former index and the layer.
    pub fn remove(&mut self, id: LayerId) -> Option<(usize, Layer)> {
        let index = self.index_of(id)?;
        let layer = self.layers.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.multi.retain(|m| *m != id);
        if self.drag.as_ref().is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        Some((index, layer))
    }

    /// Overwrite every field but the id of layer `id` with `state`.
    pub fn restore_state(&mut self, id: LayerId, state: &Layer) -> bool {
        let Some(layer) = self.get_mut(id) else {
            return false;
        };
        layer.assign_state(state);
        layer.normalize();
        true
    }

    /// Swap in a whole layer list, keeping its ids. Selection and any drag
    /// are dropped; the id generator only moves forward.
    pub fn replace_all(&mut self, layers: Vec<Layer>) {
        self.layers.clear();
        self.selected = None;
        self.multi.clear();
        self.drag = None;
        for mut layer in layers {
            layer.normalize();
            self.ids.observe(layer.id);
            self.layers.push(layer);
        }
        log::debug!("replace scene: {} layers", self.layers.len());
    }

    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    /// Move a layer to the end of the array, on top of every equal-z layer.
    pub fn bring_to_front(&mut self, id: LayerId) {
        if let Some(index) = self.index_of(id) {
            let layer = self.layers.remove(index);
            self.layers.push(layer);
        }
    }

    /// Indices into [`layers`](Self::layers) in paint order.
    pub fn draw_order(&self) -> Vec<usize> {
        draw_order(&self.layers)
    }

    /// Layers in paint order.
    pub fn ordered(&self) -> impl Iterator<Item = &Layer> {
        self.draw_order().into_iter().map(|i| &self.layers[i])
    }

    pub fn set_z(&mut self, id: LayerId, z: i32) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.z = z;
                true
            }
            None => false,
        }
    }

    pub fn set_position(&mut self, id: LayerId, x: i32, y: i32) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.dest.x = x;
                layer.dest.y = y;
                true
            }
            None => false,
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selected_id(&self) -> Option<LayerId> {
        self.selected.filter(|id| self.get(*id).is_some())
    }

    pub fn selected(&self) -> Option<&Layer> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Select a layer (ignored if it does not exist) or clear with `None`.
    pub fn select(&mut self, id: Option<LayerId>) -> bool {
        match id {
            Some(id) if self.get(id).is_none() => false,
            _ => {
                self.selected = id;
                true
            }
        }
    }

    /// Multi-selection, in toggle order.
    pub fn multi_selected(&self) -> &[LayerId] {
        &self.multi
    }

    /// Toggle `id` in the multi-selection; it also becomes the single
    /// selection. Returns whether it is now a member.
    pub fn toggle_multi(&mut self, id: LayerId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        if let Some(pos) = self.multi.iter().position(|m| *m == id) {
            self.multi.remove(pos);
            false
        } else {
            self.multi.push(id);
            true
        }
    }

    pub fn select_all(&mut self) {
        self.multi = self.layers.iter().map(|l| l.id).collect();
    }

    pub fn clear_multi(&mut self) {
        self.multi.clear();
    }

    // ─── Hit testing ─────────────────────────────────────────────────────

    /// Topmost layer whose dest contains `pt`.
    pub fn hit_test_body(&self, pt: Point) -> Option<LayerId> {
        hit_test(&self.layers, pt)
    }

    /// Handle of the selected layer under `pt`.
    pub fn hit_test_handle(&self, pt: Point) -> Option<Handle> {
        let layer = self.selected()?;
        hit_handle(&layer.dest, pt, self.handle_radius)
    }

    // ─── Interaction ─────────────────────────────────────────────────────

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_kind(&self) -> Option<DragKind> {
        self.drag.as_ref().map(|d| d.kind)
    }

    /// Start a resize (handle hit) or move (body hit). A miss clears the
    /// selection. Returns whether a drag started.
    pub fn begin_interaction(&mut self, pt: Point) -> bool {
        if let Some(handle) = self.hit_test_handle(pt)
            && let Some(id) = self.selected
        {
            return self.start_drag(id, DragKind::Resize(handle), pt);
        }
        if let Some(id) = self.hit_test_body(pt) {
            self.selected = Some(id);
            self.bring_to_front(id);
            return self.start_drag(id, DragKind::Move, pt);
        }
        self.selected = None;
        false
    }

    fn start_drag(&mut self, id: LayerId, kind: DragKind, start: Point) -> bool {
        let Some(layer) = self.get(id) else {
            return false;
        };
        let (scale_x, scale_y) = layer.scale_factors();
        log::trace!("begin {kind:?} on {id} at ({}, {})", start.x, start.y);
        self.drag = Some(DragState {
            id,
            kind,
            start,
            origin_dest: layer.dest,
            origin_src: layer.src,
            scale_x,
            scale_y,
        });
        true
    }

    /// Apply the active drag for pointer position `pt`.
    pub fn update_interaction(&mut self, pt: Point) -> bool {
        let Some(drag) = self.drag.clone() else {
            return false;
        };
        let keep_aspect = self.keep_aspect;
        let Some(layer) = self.get_mut(drag.id) else {
            return false;
        };
        let dx = pt.x - drag.start.x;
        let dy = pt.y - drag.start.y;
        let o = drag.origin_dest;
        match drag.kind {
            DragKind::Move => {
                layer.dest.x = round_px(o.x as f64 + dx);
                layer.dest.y = round_px(o.y as f64 + dy);
            }
            DragKind::Resize(handle) if handle.is_corner() => {
                layer.dest = if keep_aspect {
                    aspect_resize(&o, handle, pt)
                } else {
                    free_resize(&o, handle, dx, dy)
                };
            }
            DragKind::Resize(handle) => {
                let buffer = (layer.pixels.width() as i32, layer.pixels.height() as i32);
                let (src, dest) = edge_crop(&drag, handle, dx, dy, buffer);
                layer.src = src;
                layer.dest = dest;
            }
        }
        log::trace!("{:?} {} -> {} src {}", drag.kind, drag.id, layer.dest, layer.src);
        true
    }

    /// Finish the drag, returning the layer it acted on.
    pub fn end_interaction(&mut self) -> Option<LayerId> {
        self.drag.take().map(|d| d.id)
    }
}

// ─── Resize geometry ─────────────────────────────────────────────────────

/// Original edges with the pointer delta applied to the dragged sides.
fn moved_edges(o: &IRect, handle: Handle, dx: f64, dy: f64) -> (f64, f64, f64, f64) {
    let (mut l, mut t) = (o.x as f64, o.y as f64);
    let (mut r, mut b) = (o.right() as f64, o.bottom() as f64);
    if handle.has_west() {
        l += dx;
    }
    if handle.has_east() {
        r += dx;
    }
    if handle.has_north() {
        t += dy;
    }
    if handle.has_south() {
        b += dy;
    }
    (l, t, r, b)
}

/// Corner resize keeping the original aspect ratio. Of the size driven by
/// the pointer's x offset and the one driven by its y offset, the y-driven
/// one wins only when it is no larger on both axes.
fn aspect_resize(o: &IRect, handle: Handle, pt: Point) -> IRect {
    let Some(anchor) = handle.opposite_corner(o) else {
        return *o;
    };
    let a = o.w as f64 / o.h.max(1) as f64;
    let vx = pt.x - anchor.x;
    let vy = pt.y - anchor.y;

    let w_from_x = vx.abs();
    let h_from_x = round_px(w_from_x / a) as f64;
    let h_from_y = vy.abs();
    let w_from_y = round_px(h_from_y * a) as f64;

    let (mut w, mut h) = (w_from_x, h_from_x);
    if w_from_y <= w_from_x && h_from_y <= h_from_x {
        w = w_from_y;
        h = h_from_y;
    }
    let w = round_px(w).max(1);
    let h = round_px(h).max(1);

    // Quadrant signs place the box on the dragged side of the anchor
    let (ax, ay) = (anchor.x as i32, anchor.y as i32);
    let x = if handle.has_west() { ax - w } else { ax };
    let y = if handle.has_north() { ay - h } else { ay };
    IRect::new(x, y, w, h)
}

fn free_resize(o: &IRect, handle: Handle, dx: f64, dy: f64) -> IRect {
    let (l, t, r, b) = moved_edges(o, handle, dx, dy);
    IRect::new(
        round_px(l.min(r)),
        round_px(t.min(b)),
        round_px((r - l).abs().max(1.0)),
        round_px((b - t).abs().max(1.0)),
    )
}

/// Edge handles crop the source inward only. Dragging past the original
/// extent restores the drag-start geometry.
fn edge_crop(
    drag: &DragState,
    handle: Handle,
    dx: f64,
    dy: f64,
    (buf_w, buf_h): (i32, i32),
) -> (IRect, IRect) {
    let o = drag.origin_dest;
    let os = drag.origin_src;
    let (sx, sy) = (drag.scale_x, drag.scale_y);
    let mut src = os;
    let mut dest = o;

    let (l, t, r, b) = moved_edges(&o, handle, dx, dy);
    let nw = (r - l).abs().max(1.0);
    let nh = (b - t).abs().max(1.0);
    let dw = round_px(nw - o.w as f64);
    let dh = round_px(nh - o.h as f64);

    match handle {
        Handle::E if dw < 0 => {
            src.w = clamp_int(
                (os.w + round_px(dw as f64 / sx)) as f64,
                1,
                buf_w - os.x,
            );
            dest.w = round_px(src.w as f64 * sx).max(1);
        }
        Handle::W if dw < 0 => {
            let dsw = round_px(-dw as f64 / sx);
            src.x = clamp_int((os.x + dsw) as f64, 0, os.x + os.w - 1);
            src.w = clamp_int((os.w - dsw) as f64, 1, buf_w - src.x);
            dest.w = round_px(src.w as f64 * sx).max(1);
            dest.x = o.x + (o.w - dest.w);
        }
        Handle::S if dh < 0 => {
            src.h = clamp_int(
                (os.h + round_px(dh as f64 / sy)) as f64,
                1,
                buf_h - os.y,
            );
            dest.h = round_px(src.h as f64 * sy).max(1);
        }
        Handle::N if dh < 0 => {
            let dsh = round_px(-dh as f64 / sy);
            src.y = clamp_int((os.y + dsh) as f64, 0, os.y + os.h - 1);
            src.h = clamp_int((os.h - dsh) as f64, 1, buf_h - src.y);
            dest.h = round_px(src.h as f64 * sy).max(1);
            dest.y = o.y + (o.h - dest.h);
        }
        _ => {}
    }
    (src, dest)
}
