//! Editor session.
//!
//! Owns the document, viewport, scene, crop marquee, and history, and turns
//! input events and commands into mutations. Every mutation records history
//! here: the scene and marquee never push on their own.
//!
//! | Operation | Raster track | Layer track |
//! |-----------|--------------|-------------|
//! | brush on document, filter, canvas size | snapshot | |
//! | layer drag, brush on layer, z, position, resize, text edit | | `modify` |
//! | import, duplicate, text insert, apply crop | | `add` |
//! | delete | | `remove` |
//! | document rotate / flip, clear | snapshot | `replace` |

use crate::brush::{Brush, RoundBrush};
use crate::crop::{CropMarquee, CropMode};
use crate::filters::PixelFilter;
use crate::history::{EditHistory, LayerAction};
use crate::input::{InputEvent, PointerButton, PointerKind};
use crate::scene::SceneModel;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{Gesture, StrokeTarget, ToolKind, document_unchanged};
use kurbo::Point;
use lp_core::config::EditorConfig;
use lp_core::geom::{IRect, round_px};
use lp_core::id::LayerId;
use lp_core::model::{Layer, LayerMeta, TextMeta};
use lp_core::persist::{LayerRecord, PersistError, SessionState, SessionStore};
use lp_core::raster::{Raster, Rotation};
use lp_core::size::parse_size;
use lp_core::viewport::Viewport;
use lp_render::chrome::{MarqueeChrome, SelectionChrome, marquee_chrome, selection_chrome};
use lp_render::composite::{composite_scene, cut};
use std::sync::Arc;

/// Smallest and largest text size accepted for text layers.
const TEXT_SIZE_RANGE: (f32, f32) = (6.0, 512.0);

/// Renders text attributes to pixels. Glyph shaping lives outside the core.
pub trait TextRasterizer {
    fn rasterize(&self, meta: &TextMeta) -> Raster;
}

pub struct Editor {
    document: Arc<Raster>,
    viewport: Viewport,
    scene: SceneModel,
    crop: CropMarquee,
    history: EditHistory,
    tool: ToolKind,
    gesture: Option<Gesture>,
    brush: Box<dyn Brush>,
    config: EditorConfig,
    space_held: bool,
    coarse_pointer: bool,
}

impl Editor {
    /// A blank (transparent) document of `doc_w × doc_h` in a
    /// `view_w × view_h` canvas.
    pub fn new(config: EditorConfig, doc_w: u32, doc_h: u32, view_w: u32, view_h: u32) -> Self {
        let doc_w = EditorConfig::clamp_side(doc_w as i64);
        let doc_h = EditorConfig::clamp_side(doc_h as i64);
        Self::with_document(config, Raster::new(doc_w, doc_h), view_w, view_h)
    }

    pub fn with_document(config: EditorConfig, document: Raster, view_w: u32, view_h: u32) -> Self {
        let document = Arc::new(document);
        let mut viewport = Viewport::new(config.min_scale, config.max_scale);
        viewport.reset(document.width(), document.height(), view_w, view_h);
        let mut crop = CropMarquee::new(config.handle_radius);
        crop.set_to_document(document.width(), document.height());
        let mut history = EditHistory::new(config.history_limit);
        history.push_raster(Arc::clone(&document));
        Self {
            scene: SceneModel::new(config.handle_radius, config.keep_aspect),
            document,
            viewport,
            crop,
            history,
            tool: ToolKind::default(),
            gesture: None,
            brush: Box::new(RoundBrush::default()),
            config,
            space_held: false,
            coarse_pointer: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &Raster {
        &self.document
    }

    /// Shared handle to the live document pixels.
    pub fn document_arc(&self) -> &Arc<Raster> {
        &self.document
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    pub fn crop(&self) -> &CropMarquee {
        &self.crop
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn set_brush(&mut self, brush: Box<dyn Brush>) {
        self.brush = brush;
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool == ToolKind::Crop {
            self.set_crop_active(true);
            return;
        }
        if self.tool == ToolKind::Crop {
            self.crop.toggle(Some(false));
        }
        self.tool = tool;
    }

    /// Select mode makes clicks toggle multi-selection membership. Entering
    /// it seeds the set with the current selection; leaving it empties the set.
    pub fn select_mode(&mut self, on: bool) {
        if on {
            self.set_tool(ToolKind::Select);
            if let Some(id) = self.scene.selected_id()
                && !self.scene.multi_selected().contains(&id)
            {
                self.scene.toggle_multi(id);
            }
        } else {
            self.scene.clear_multi();
            if self.tool == ToolKind::Select {
                self.set_tool(ToolKind::Objects);
            }
        }
    }

    pub fn set_view_size(&mut self, view_w: u32, view_h: u32) {
        self.viewport.set_view_size(view_w, view_h);
    }

    /// Touch input needs far larger handles.
    pub fn set_coarse_pointer(&mut self, coarse: bool) {
        self.coarse_pointer = coarse;
        let radius = if coarse {
            self.config.touch_handle_radius
        } else {
            self.config.handle_radius
        };
        self.scene.handle_radius = radius;
        self.crop.handle_radius = radius;
    }

    fn handle_radius(&self) -> f64 {
        self.scene.handle_radius
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one input event. Returns whether a redraw is needed.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, button, kind } => {
                if *kind == PointerKind::Touch && !self.coarse_pointer {
                    self.set_coarse_pointer(true);
                }
                self.pointer_down(*x, *y, *button)
            }
            InputEvent::PointerMove { x, y } => self.pointer_move(*x, *y),
            InputEvent::PointerUp { .. } => self.pointer_up(),
            InputEvent::PointerCancel => self.pointer_cancel(),
            InputEvent::Wheel { x, y, dx, dy, ctrl } => self.wheel(*x, *y, *dx, *dy, *ctrl),
            InputEvent::Pinch { cx, cy, factor } => self.pinch(*cx, *cy, *factor),
            InputEvent::Key {
                key,
                ctrl,
                shift,
                alt,
                meta,
            } => match ShortcutMap::resolve(key, *ctrl, *shift, *alt, *meta) {
                Some(action) => self.perform(action),
                None => false,
            },
            InputEvent::KeyUp { key } => {
                if key == " " {
                    self.space_held = false;
                }
                false
            }
        }
    }

    /// Claim the gesture. `(x, y)` are canvas coordinates.
    pub fn pointer_down(&mut self, x: f64, y: f64, button: PointerButton) -> bool {
        if self.gesture.is_some() {
            log::warn!("pointer down during an open gesture, finishing it first");
            self.finish_gesture();
        }
        let canvas_pt = Point::new(x, y);
        let ip = self.viewport.canvas_to_image(canvas_pt);

        if self.tool == ToolKind::Crop && self.crop.active {
            let mode = self.crop.hit_test(ip).unwrap_or(CropMode::Move);
            self.crop.begin_drag(mode, ip);
            self.gesture = Some(Gesture::Crop);
            return true;
        }

        if self.space_held || button == PointerButton::Middle {
            self.gesture = Some(Gesture::Pan {
                start: canvas_pt,
                tx0: self.viewport.tx,
                ty0: self.viewport.ty,
            });
            return true;
        }

        if self.tool == ToolKind::Select {
            return match self.scene.hit_test_body(ip) {
                Some(hit) => {
                    self.scene.toggle_multi(hit);
                    true
                }
                None => false,
            };
        }

        if self.tool != ToolKind::Brush {
            let had_selection = self.scene.selected_id().is_some();
            if self.scene.begin_interaction(ip) {
                if let Some(before) = self.scene.selected().cloned() {
                    self.gesture = Some(Gesture::Layer { before });
                }
                return true;
            }
            return had_selection;
        }

        let (target, before) = match self.scene.hit_test_body(ip).and_then(|id| self.scene.get(id)) {
            Some(layer) => (StrokeTarget::Layer(layer.id), Some(layer.clone())),
            None => (StrokeTarget::Document, None),
        };
        self.gesture = Some(Gesture::Stroke {
            target,
            before,
            last: ip,
        });
        true
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let Some(mut gesture) = self.gesture.take() else {
            return false;
        };
        let canvas_pt = Point::new(x, y);
        let ip = self.viewport.canvas_to_image(canvas_pt);
        let changed = match &mut gesture {
            Gesture::Crop => {
                let bounds = self.document.bounds();
                self.crop.update_drag(ip, &bounds)
            }
            Gesture::Pan { start, tx0, ty0 } => {
                self.viewport
                    .set_translation(*tx0 + (canvas_pt.x - start.x), *ty0 + (canvas_pt.y - start.y));
                true
            }
            Gesture::Layer { .. } => self.scene.update_interaction(ip),
            Gesture::Stroke { target, last, .. } => {
                let from = *last;
                *last = ip;
                self.paint_segment(*target, from, ip)
            }
        };
        self.gesture = Some(gesture);
        changed
    }

    pub fn pointer_up(&mut self) -> bool {
        self.finish_gesture()
    }

    /// Identical to pointer-up: whatever changed is recorded once.
    pub fn pointer_cancel(&mut self) -> bool {
        self.finish_gesture()
    }

    fn finish_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        log::trace!("finish {} gesture", gesture.name());
        match gesture {
            Gesture::Crop => self.crop.end_drag(),
            Gesture::Pan { .. } => {}
            Gesture::Layer { before } => {
                if let Some(id) = self.scene.end_interaction() {
                    self.record_modify(id, before);
                }
            }
            Gesture::Stroke {
                target: StrokeTarget::Document,
                ..
            } => {
                let unchanged = self
                    .history
                    .raster
                    .current()
                    .is_some_and(|top| document_unchanged(top, &self.document));
                if !unchanged {
                    self.snapshot();
                }
            }
            Gesture::Stroke {
                target: StrokeTarget::Layer(id),
                before,
                ..
            } => {
                if let Some(before) = before {
                    self.record_modify(id, before);
                }
            }
        }
        true
    }

    fn paint_segment(&mut self, target: StrokeTarget, from: Point, to: Point) -> bool {
        match target {
            StrokeTarget::Document => {
                let doc = Arc::make_mut(&mut self.document);
                self.brush.stroke(doc, from, to, 1.0);
                true
            }
            StrokeTarget::Layer(id) => {
                let Some(layer) = self.scene.get_mut(id) else {
                    return false;
                };
                let (sx, sy) = layer.scale_factors();
                let scale = (1.0 / sx + 1.0 / sy) / 2.0;
                let a = doc_to_source(layer, from);
                let b = doc_to_source(layer, to);
                self.brush.stroke(Arc::make_mut(&mut layer.pixels), a, b, scale);
                true
            }
        }
    }

    pub fn wheel(&mut self, x: f64, y: f64, dx: f64, dy: f64, ctrl: bool) -> bool {
        if ctrl {
            let step = self.config.wheel_zoom_step;
            let factor = if dy < 0.0 { step } else { 1.0 / step };
            self.viewport.zoom_at(factor, x, y);
        } else {
            self.viewport.pan_by(-dx, -dy);
        }
        true
    }

    pub fn pinch(&mut self, cx: f64, cy: f64, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        self.viewport.zoom_at(factor, cx, cy);
        true
    }

    pub fn zoom_in(&mut self) {
        let (w, h) = self.viewport.view_size();
        self.viewport.zoom_at(self.config.zoom_step, w / 2.0, h / 2.0);
    }

    pub fn zoom_out(&mut self) {
        let (w, h) = self.viewport.view_size();
        self.viewport.zoom_at(1.0 / self.config.zoom_step, w / 2.0, h / 2.0);
    }

    pub fn zoom_reset(&mut self) {
        self.reset_view();
    }

    fn reset_view(&mut self) {
        let (w, h) = self.viewport.view_size();
        self.viewport
            .reset(self.document.width(), self.document.height(), w as u32, h as u32);
    }

    /// Run a shortcut action. Returns whether anything changed.
    pub fn perform(&mut self, action: ShortcutAction) -> bool {
        log::trace!("perform {action:?}");
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.remove_selected(),
            ShortcutAction::Duplicate => self.duplicate_selected().is_some(),
            ShortcutAction::SelectAll => {
                self.scene.select_all();
                true
            }
            ShortcutAction::Deselect => {
                self.scene.select(None);
                self.scene.clear_multi();
                true
            }
            ShortcutAction::ToggleCrop => {
                let on = !(self.tool == ToolKind::Crop && self.crop.active);
                self.set_crop_active(on);
                true
            }
            ShortcutAction::ApplyCrop => self.apply_crop().is_some(),
            ShortcutAction::ToggleBrush => {
                let next = if self.tool == ToolKind::Brush {
                    ToolKind::Objects
                } else {
                    ToolKind::Brush
                };
                self.set_tool(next);
                true
            }
            ShortcutAction::ZoomIn => {
                self.zoom_in();
                true
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
                true
            }
            ShortcutAction::ZoomReset => {
                self.zoom_reset();
                true
            }
            ShortcutAction::PanStart => {
                self.space_held = true;
                false
            }
        }
    }

    // ─── History plumbing ────────────────────────────────────────────────

    fn snapshot(&mut self) {
        self.history.push_raster(Arc::clone(&self.document));
    }

    /// Push `modify` if layer `id` differs from `before`.
    fn record_modify(&mut self, id: LayerId, before: Layer) -> bool {
        let Some(after) = self.scene.get(id) else {
            return false;
        };
        if after.same_state_as(&before) {
            return false;
        }
        let after = after.clone();
        self.history
            .push_action(LayerAction::Modify { id, before, after });
        true
    }

    /// Apply `edit` to the selected layer, recording `modify` on change.
    /// An open drag is finished first so it cannot replay over the edit.
    fn edit_selected(&mut self, edit: impl FnOnce(&mut Layer)) -> bool {
        self.finish_gesture();
        let Some(id) = self.scene.selected_id() else {
            return false;
        };
        let Some(layer) = self.scene.get_mut(id) else {
            return false;
        };
        let before = layer.clone();
        edit(layer);
        layer.normalize();
        self.record_modify(id, before)
    }

    fn record_add(&mut self, id: LayerId) {
        if let Some(layer) = self.scene.get(id) {
            let layer = layer.clone();
            self.history.push_action(LayerAction::Add { layer });
        }
    }

    /// Finish any open gesture, then undo one step of each track.
    pub fn undo(&mut self) -> bool {
        self.finish_gesture();
        let outcome = self.history.undo(&mut self.scene);
        if let Some(raster) = &outcome.raster {
            self.restore_document(Arc::clone(raster));
        }
        !outcome.is_noop()
    }

    pub fn redo(&mut self) -> bool {
        self.finish_gesture();
        let outcome = self.history.redo(&mut self.scene);
        if let Some(raster) = &outcome.raster {
            self.restore_document(Arc::clone(raster));
        }
        !outcome.is_noop()
    }

    fn restore_document(&mut self, raster: Arc<Raster>) {
        let resized =
            raster.width() != self.document.width() || raster.height() != self.document.height();
        self.document = raster;
        if resized {
            self.reset_view();
            self.crop
                .set_to_document(self.document.width(), self.document.height());
        }
    }

    // ─── Layer operations ────────────────────────────────────────────────

    /// Place an image at the top-left of the visible area.
    pub fn import_layer(&mut self, pixels: Raster) -> LayerId {
        self.finish_gesture();
        let tl = self.viewport.canvas_to_image(Point::ZERO);
        let id = self.scene.add_layer(pixels, round_px(tl.x), round_px(tl.y));
        self.record_add(id);
        id
    }

    pub fn remove_selected(&mut self) -> bool {
        self.finish_gesture();
        let Some(id) = self.scene.selected_id() else {
            return false;
        };
        let Some((index, layer)) = self.scene.remove(id) else {
            return false;
        };
        self.history
            .push_action(LayerAction::Remove { layer, index });
        true
    }

    /// Copy the selected layer, offset by `duplicate_offset`.
    pub fn duplicate_selected(&mut self) -> Option<LayerId> {
        self.finish_gesture();
        let source = self.scene.selected()?.clone();
        let offset = self.config.duplicate_offset;
        let mut copy = source;
        copy.id = self.scene.next_id();
        copy.dest.x += offset;
        copy.dest.y += offset;
        let id = self.scene.insert_layer(copy);
        self.record_add(id);
        Some(id)
    }

    pub fn set_selected_z(&mut self, z: i32) -> bool {
        self.edit_selected(|layer| layer.z = z)
    }

    pub fn set_selected_position(&mut self, x: i32, y: i32) -> bool {
        self.edit_selected(|layer| {
            layer.dest.x = x;
            layer.dest.y = y;
        })
    }

    /// Bake the crop into a `w × h` buffer, keep the center.
    pub fn resize_selected_to(&mut self, w: i64, h: i64) -> bool {
        let (tw, th) = (EditorConfig::clamp_side(w), EditorConfig::clamp_side(h));
        self.edit_selected(|layer| resize_layer(layer, tw, th))
    }

    /// Resize every multi-selected layer, recorded as one `replace`.
    pub fn resize_multi_selected_to(&mut self, w: i64, h: i64) -> bool {
        self.finish_gesture();
        let ids: Vec<LayerId> = self.scene.multi_selected().to_vec();
        if ids.is_empty() {
            return false;
        }
        let (tw, th) = (EditorConfig::clamp_side(w), EditorConfig::clamp_side(h));
        let before = self.scene.layers().to_vec();
        let mut after = before.clone();
        for layer in after.iter_mut().filter(|l| ids.contains(&l.id)) {
            resize_layer(layer, tw, th);
        }
        self.commit_replace(before, after);
        true
    }

    /// Insert a text layer centered on the document, or update the selected
    /// text layer in place.
    pub fn add_text_layer(&mut self, meta: TextMeta, text: &dyn TextRasterizer) -> LayerId {
        self.finish_gesture();
        if let Some(id) = self.scene.selected_id().filter(|id| {
            self.scene.get(*id).is_some_and(Layer::is_text)
        }) {
            self.update_selected_text(meta, text);
            return id;
        }
        let meta = clamp_text(meta);
        let pixels = text.rasterize(&meta);
        let x = round_px((self.document.width() as f64 - pixels.width() as f64) / 2.0);
        let y = round_px((self.document.height() as f64 - pixels.height() as f64) / 2.0);
        let id = self.scene.add_layer(pixels, x, y);
        if let Some(layer) = self.scene.get_mut(id) {
            layer.meta = Some(LayerMeta::Text(meta));
        }
        self.record_add(id);
        id
    }

    /// Re-rasterize the selected text layer, keeping its center.
    pub fn update_selected_text(&mut self, meta: TextMeta, text: &dyn TextRasterizer) -> bool {
        self.finish_gesture();
        if !self.scene.selected().is_some_and(Layer::is_text) {
            return false;
        }
        let meta = clamp_text(meta);
        let pixels = text.rasterize(&meta);
        self.edit_selected(|layer| {
            let center = layer.dest.center();
            let (w, h) = (pixels.width().max(1) as i32, pixels.height().max(1) as i32);
            layer.set_pixels(pixels);
            layer.dest = centered(center, w, h);
            layer.meta = Some(LayerMeta::Text(meta));
        })
    }

    // ─── Whole-scene operations ──────────────────────────────────────────

    /// Rotate the selected layer, or the document with every layer.
    pub fn rotate(&mut self, rotation: Rotation) -> bool {
        self.finish_gesture();
        if self.scene.selected_id().is_some() {
            return self.edit_selected(|layer| rotate_layer(layer, rotation));
        }
        let (old_w, old_h) = (self.document.width() as f64, self.document.height() as f64);
        let rotated = self.document.rotated(rotation);
        let (new_w, new_h) = (rotated.width() as f64, rotated.height() as f64);
        let before = self.scene.layers().to_vec();
        let mut after = before.clone();
        for layer in &mut after {
            let c = layer.dest.center();
            let (dx, dy) = rotation.rotate_offset(c.x - old_w / 2.0, c.y - old_h / 2.0);
            rotate_layer(layer, rotation);
            layer.dest = centered(
                Point::new(new_w / 2.0 + dx, new_h / 2.0 + dy),
                layer.dest.w,
                layer.dest.h,
            );
        }
        log::debug!("rotate document {}°", rotation.degrees());
        self.replace_document(rotated);
        self.commit_replace(before, after);
        true
    }

    /// Flip the selected layer, or the document with every layer mirrored.
    pub fn flip(&mut self, horizontal: bool, vertical: bool) -> bool {
        if !horizontal && !vertical {
            return false;
        }
        self.finish_gesture();
        if self.scene.selected_id().is_some() {
            return self.edit_selected(|layer| {
                let flipped = layer.baked().flipped(horizontal, vertical);
                layer.set_pixels(flipped);
            });
        }
        let (doc_w, doc_h) = (self.document.width() as i32, self.document.height() as i32);
        let flipped = self.document.flipped(horizontal, vertical);
        let before = self.scene.layers().to_vec();
        let mut after = before.clone();
        for layer in &mut after {
            let pixels = layer.baked().flipped(horizontal, vertical);
            layer.set_pixels(pixels);
            if horizontal {
                layer.dest.x = doc_w - layer.dest.right();
            }
            if vertical {
                layer.dest.y = doc_h - layer.dest.bottom();
            }
        }
        log::debug!("flip document h={horizontal} v={vertical}");
        self.replace_document(flipped);
        self.commit_replace(before, after);
        true
    }

    /// Clear the document pixels and remove every layer.
    pub fn clear(&mut self) {
        self.finish_gesture();
        let before = self.scene.layers().to_vec();
        let blank = Raster::new(self.document.width(), self.document.height());
        self.replace_document(blank);
        self.commit_replace(before, Vec::new());
    }

    /// Resize the document. With `preserve` the old content is fitted and
    /// centered, never stretched.
    pub fn set_canvas_size(&mut self, w: i64, h: i64, preserve: bool) {
        self.finish_gesture();
        let (tw, th) = (EditorConfig::clamp_side(w), EditorConfig::clamp_side(h));
        let next = if preserve {
            self.document.fitted_into(tw, th)
        } else {
            Raster::new(tw, th)
        };
        log::debug!("canvas size {tw}×{th} preserve={preserve}");
        self.replace_document(next);
    }

    /// [`set_canvas_size`](Self::set_canvas_size) from typed input such as
    /// `1024x768`.
    pub fn set_canvas_size_text(&mut self, text: &str, preserve: bool) -> Result<(u32, u32), String> {
        let (w, h) = parse_size(text)?;
        self.set_canvas_size(w as i64, h as i64, preserve);
        Ok((self.document.width(), self.document.height()))
    }

    /// Swap the document, re-frame the view, and snapshot.
    fn replace_document(&mut self, next: Raster) {
        let resized = next.width() != self.document.width() || next.height() != self.document.height();
        self.document = Arc::new(next);
        if resized {
            self.reset_view();
        }
        self.crop
            .set_to_document(self.document.width(), self.document.height());
        self.snapshot();
    }

    fn commit_replace(&mut self, before: Vec<Layer>, after: Vec<Layer>) {
        let selected = self.scene.selected_id();
        let multi = self.scene.multi_selected().to_vec();
        self.scene.replace_all(after.clone());
        // replace_all drops the selection; restore what survived
        for id in multi {
            self.scene.toggle_multi(id);
        }
        self.scene.select(selected);
        self.history
            .push_action(LayerAction::Replace { before, after });
    }

    // ─── Raster operations ───────────────────────────────────────────────

    pub fn apply_filter(&mut self, filter: &dyn PixelFilter) {
        self.finish_gesture();
        log::debug!("filter {}", filter.name());
        filter.apply(Arc::make_mut(&mut self.document));
        self.snapshot();
    }

    /// Mutate the document pixels externally, then snapshot.
    pub fn edit_document(&mut self, edit: impl FnOnce(&mut Raster)) {
        self.finish_gesture();
        edit(Arc::make_mut(&mut self.document));
        self.snapshot();
    }

    // ─── Crop ────────────────────────────────────────────────────────────

    /// Show or hide the marquee. Showing it resets it to the whole document
    /// and switches to the crop tool.
    pub fn set_crop_active(&mut self, on: bool) {
        self.finish_gesture();
        self.crop.toggle(Some(on));
        if on {
            self.tool = ToolKind::Crop;
            self.crop
                .set_to_document(self.document.width(), self.document.height());
        } else if self.tool == ToolKind::Crop {
            self.tool = ToolKind::Objects;
        }
    }

    /// Cut the marquee out of the composited scene into a new layer at the
    /// marquee origin.
    pub fn apply_crop(&mut self) -> Option<LayerId> {
        if !self.crop.active || self.crop.is_dragging() {
            return None;
        }
        let rect = self.crop.rect.intersect(&self.document.bounds())?;
        let flat = self.composite();
        let piece = cut(&flat, &rect)?;
        let id = self.scene.add_layer(piece, rect.x, rect.y);
        self.record_add(id);
        self.set_crop_active(false);
        log::debug!("crop {rect} -> layer {id}");
        Some(id)
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Document with every layer flattened on top.
    pub fn composite(&self) -> Raster {
        composite_scene(&self.document, self.scene.layers())
    }

    pub fn selection_chrome(&self) -> Option<SelectionChrome> {
        let layer = self.scene.selected()?;
        Some(selection_chrome(
            &layer.dest,
            self.handle_radius(),
            self.viewport.scale,
        ))
    }

    pub fn marquee_chrome(&self) -> Option<MarqueeChrome> {
        if !self.crop.active {
            return None;
        }
        Some(marquee_chrome(
            &self.crop.rect,
            &self.document.bounds(),
            self.handle_radius(),
            self.viewport.scale,
        ))
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn save_state(&self) -> SessionState {
        SessionState {
            document: (*self.document).clone(),
            view: Some(self.viewport.view_state()),
            layers: self.scene.layers().iter().map(LayerRecord::from_layer).collect(),
        }
    }

    /// Resume a saved session. A missing view falls back to a reset.
    ///
    /// The state goes through the same checks as a decoded one, so a
    /// hand-built state with an oversized document or repeated ids is
    /// refused rather than half-loaded.
    pub fn from_state(
        config: EditorConfig,
        state: SessionState,
        view_w: u32,
        view_h: u32,
    ) -> Result<Self, PersistError> {
        state.validate()?;
        let SessionState {
            document,
            view,
            layers,
        } = state;
        let mut editor = Self::with_document(config, document, view_w, view_h);
        editor
            .scene
            .replace_all(layers.into_iter().map(LayerRecord::into_layer).collect());
        if let Some(view) = view {
            editor.viewport.restore(view);
        }
        Ok(editor)
    }

    /// Load from `store`, starting fresh on any failure or when nothing has
    /// been saved.
    pub fn load_from(
        config: EditorConfig,
        store: &dyn SessionStore,
        (doc_w, doc_h): (u32, u32),
        (view_w, view_h): (u32, u32),
    ) -> Self {
        let loaded = store.load().and_then(|state| {
            state
                .map(|state| Self::from_state(config.clone(), state, view_w, view_h))
                .transpose()
        });
        match loaded {
            Ok(Some(editor)) => editor,
            Ok(None) => Self::new(config, doc_w, doc_h, view_w, view_h),
            Err(e) => {
                log::warn!("session load failed, starting fresh: {e}");
                Self::new(config, doc_w, doc_h, view_w, view_h)
            }
        }
    }

    /// Save outside of any gesture; mid-drag state is not consistent.
    pub fn save_to(&self, store: &mut dyn SessionStore) -> Result<(), PersistError> {
        if self.gesture.is_some() {
            log::warn!("saving during an open gesture");
        }
        store.save(&self.save_state())
    }
}

// ─── Layer helpers ───────────────────────────────────────────────────────

/// A `w × h` rect centered on `center`.
fn centered(center: Point, w: i32, h: i32) -> IRect {
    IRect::new(
        round_px(center.x - w as f64 / 2.0),
        round_px(center.y - h as f64 / 2.0),
        w,
        h,
    )
}

fn resize_layer(layer: &mut Layer, w: u32, h: u32) {
    let center = layer.dest.center();
    let pixels = layer.baked().resampled(w, h);
    layer.set_pixels(pixels);
    layer.dest = centered(center, w as i32, h as i32);
}

/// Bake the crop, rotate the pixels, and swap the displayed size about the
/// center for quarter turns.
fn rotate_layer(layer: &mut Layer, rotation: Rotation) {
    let pixels = layer.baked().rotated(rotation);
    layer.set_pixels(pixels);
    if rotation.swaps_axes() {
        let center = layer.dest.center();
        layer.dest = centered(center, layer.dest.h, layer.dest.w);
    }
}

fn clamp_text(mut meta: TextMeta) -> TextMeta {
    meta.size = meta.size.clamp(TEXT_SIZE_RANGE.0, TEXT_SIZE_RANGE.1);
    meta
}

/// Map a document point into `layer`'s pixel buffer through its dest and
/// src rects.
fn doc_to_source(layer: &Layer, pt: Point) -> Point {
    let (d, s) = (layer.dest, layer.src);
    let tx = (pt.x - d.x as f64) / d.w.max(1) as f64;
    let ty = (pt.y - d.y as f64) / d.h.max(1) as f64;
    Point::new(s.x as f64 + tx * s.w as f64, s.y as f64 + ty * s.h as f64)
}
