//! Integration tests: dual-track undo/redo through the editor session.
//!
//! Drives `Editor` with pointer events and commands, then checks that one
//! undo step reverses exactly one user action across both history tracks.

use lp_core::config::EditorConfig;
use lp_core::geom::IRect;
use lp_core::id::LayerId;
use lp_core::raster::Raster;
use lp_editor::history::RasterHistory;
use lp_editor::input::InputEvent;
use lp_editor::session::Editor;
use lp_editor::tools::ToolKind;
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// 800×600 document shown 1:1 so canvas and document points coincide.
fn editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    Editor::new(EditorConfig::default(), 800, 600, 800, 600)
}

/// A at the origin (id 1), then B at (100, 100, 200, 200) (id 2).
fn editor_with_two_layers() -> (Editor, LayerId, LayerId) {
    let mut ed = editor();
    let a = ed.import_layer(Raster::filled(50, 50, [255, 0, 0, 255]));
    let b = ed.import_layer(Raster::filled(200, 200, [0, 0, 255, 255]));
    assert!(ed.set_selected_position(100, 100));
    (ed, a, b)
}

fn dest(ed: &Editor, id: LayerId) -> IRect {
    ed.scene().get(id).unwrap().dest
}

fn drag(ed: &mut Editor, from: (f64, f64), to: (f64, f64)) {
    ed.handle(&InputEvent::down(from.0, from.1));
    ed.handle(&InputEvent::moved(to.0, to.1));
    ed.handle(&InputEvent::up(to.0, to.1));
}

/// Ids, rects, and pixel content of every layer, sorted by id. Clicking a
/// layer raises it in the array without an undo entry, so array order is
/// not compared.
fn layer_summary(ed: &Editor) -> Vec<(u32, IRect, IRect, i32, Raster)> {
    let mut out: Vec<_> = ed
        .scene()
        .layers()
        .iter()
        .map(|l| (l.id.get(), l.src, l.dest, l.z, (*l.pixels).clone()))
        .collect();
    out.sort_by_key(|l| l.0);
    out
}

// ─── Resize scenario ────────────────────────────────────────────────────

#[test]
fn ids_are_assigned_in_import_order() {
    let (_, a, b) = editor_with_two_layers();
    assert_eq!((a.get(), b.get()), (1, 2));
}

#[test]
fn nw_resize_anchors_at_opposite_corner() {
    let (mut ed, _, b) = editor_with_two_layers();
    drag(&mut ed, (100.0, 100.0), (150.0, 140.0));

    let r = dest(&ed, b);
    assert_eq!(r, IRect::new(150, 150, 150, 150));
    assert_eq!((r.right(), r.bottom()), (300, 300));
}

#[test]
fn undo_restores_rect_and_redo_reapplies() {
    let (mut ed, _, b) = editor_with_two_layers();
    drag(&mut ed, (100.0, 100.0), (150.0, 140.0));

    assert!(ed.undo());
    assert_eq!(dest(&ed, b), IRect::new(100, 100, 200, 200));

    assert!(ed.redo());
    assert_eq!(dest(&ed, b), IRect::new(150, 150, 150, 150));
}

#[test]
fn new_action_clears_redo() {
    let (mut ed, _, b) = editor_with_two_layers();
    drag(&mut ed, (100.0, 100.0), (150.0, 140.0));
    ed.undo();
    assert!(ed.can_redo());

    ed.set_selected_z(3);
    assert!(!ed.can_redo());
    assert!(!ed.redo());
    assert_eq!(dest(&ed, b), IRect::new(100, 100, 200, 200));
}

#[test]
fn undo_during_drag_finishes_the_drag_first() {
    let (mut ed, _, b) = editor_with_two_layers();
    ed.handle(&InputEvent::down(200.0, 200.0));
    ed.handle(&InputEvent::moved(210.0, 220.0));
    assert_eq!(dest(&ed, b), IRect::new(110, 120, 200, 200));

    // the open move is recorded, then immediately undone
    assert!(ed.undo());
    assert!(ed.gesture().is_none());
    assert_eq!(dest(&ed, b), IRect::new(100, 100, 200, 200));
    assert!(ed.redo());
    assert_eq!(dest(&ed, b), IRect::new(110, 120, 200, 200));
}

// ─── Round trip ─────────────────────────────────────────────────────────

#[test]
fn n_structured_actions_undo_and_redo_exactly() {
    let mut ed = editor();
    let start = layer_summary(&ed);

    let a = ed.import_layer(Raster::filled(40, 30, [1, 2, 3, 255]));
    ed.set_selected_position(10, 10);
    ed.duplicate_selected();
    ed.set_selected_z(5);
    ed.resize_selected_to(80, 60);
    ed.import_layer(Raster::filled(20, 20, [9, 9, 9, 255]));
    ed.remove_selected();
    ed.handle(&InputEvent::down(15.0, 15.0));
    ed.handle(&InputEvent::moved(35.0, 45.0));
    ed.handle(&InputEvent::up(35.0, 45.0));
    assert!(ed.scene().get(a).is_some());

    let end = layer_summary(&ed);
    let steps = ed.history().layers.len();
    assert_eq!(steps, 8);

    for _ in 0..steps {
        assert!(ed.undo());
    }
    assert_eq!(layer_summary(&ed), start);
    assert!(!ed.can_undo());

    for _ in 0..steps {
        assert!(ed.redo());
    }
    assert_eq!(layer_summary(&ed), end);
}

#[test]
fn remove_undo_restores_original_position_in_array() {
    let (mut ed, a, b) = editor_with_two_layers();
    // select A by clicking it, then delete
    ed.handle(&InputEvent::down(10.0, 10.0));
    ed.handle(&InputEvent::up(10.0, 10.0));
    assert_eq!(ed.scene().selected_id(), Some(a));
    let order: Vec<LayerId> = ed.scene().layers().iter().map(|l| l.id).collect();

    assert!(ed.remove_selected());
    assert_eq!(ed.scene().len(), 1);
    assert!(ed.undo());
    let restored: Vec<LayerId> = ed.scene().layers().iter().map(|l| l.id).collect();
    assert_eq!(restored, order);
    assert!(ed.scene().get(b).is_some());
}

#[test]
fn ids_stay_monotonic_after_undo() {
    let (mut ed, _, b) = editor_with_two_layers();
    ed.undo(); // position
    ed.undo(); // add B
    assert!(ed.scene().get(b).is_none());
    let c = ed.import_layer(Raster::new(10, 10));
    assert_eq!(c.get(), 3);
}

// ─── Dual track ─────────────────────────────────────────────────────────

#[test]
fn one_undo_pops_both_tracks() {
    let (mut ed, _, b) = editor_with_two_layers();
    ed.set_tool(ToolKind::Brush);
    // stroke on empty document area
    drag(&mut ed, (500.0, 500.0), (600.0, 500.0));
    assert_eq!(ed.history().raster.len(), 2);
    assert!(!ed.document().is_blank());

    // a single undo reverses the stroke and the layer position together
    assert!(ed.undo());
    assert!(ed.document().is_blank());
    assert_eq!(dest(&ed, b), IRect::new(0, 0, 200, 200));
}

#[test]
fn clear_is_one_replace_plus_one_snapshot() {
    let (mut ed, _, _) = editor_with_two_layers();
    let before = layer_summary(&ed);
    ed.clear();
    assert!(ed.scene().is_empty());

    assert!(ed.undo());
    assert_eq!(layer_summary(&ed), before);
    assert!(ed.redo());
    assert!(ed.scene().is_empty());
}

#[test]
fn undo_buttons_follow_either_track() {
    let mut ed = editor();
    assert!(!ed.can_undo());
    ed.edit_document(|r| r.put_pixel(0, 0, [1, 1, 1, 255]));
    assert!(ed.can_undo());
    assert!(!ed.history().layers.can_undo());
    ed.undo();
    assert!(!ed.can_undo());
    assert!(ed.can_redo());
}

// ─── Capacity ───────────────────────────────────────────────────────────

#[test]
fn raster_history_drops_oldest_beyond_limit() {
    let limit = 5;
    let k = 3;
    let mut h = RasterHistory::new(limit);
    for i in 0..(limit + k) {
        h.push(Arc::new(Raster::filled(1, 1, [i as u8, 0, 0, 255])));
    }
    assert_eq!(h.len(), limit);

    let mut last = None;
    while let Some(r) = h.undo() {
        last = Some(r);
    }
    // the oldest reachable state is snapshot k, not 0
    assert_eq!(last.unwrap().pixel(0, 0), Some([k as u8, 0, 0, 255]));
}

#[test]
fn editor_history_respects_configured_limit() {
    let config = EditorConfig {
        history_limit: 3,
        ..EditorConfig::default()
    };
    let mut ed = Editor::new(config, 10, 10, 10, 10);
    for i in 0..10u8 {
        ed.edit_document(|r| r.put_pixel(0, 0, [i, 0, 0, 255]));
    }
    assert_eq!(ed.history().raster.len(), 3);
    assert!(ed.undo());
    assert!(ed.undo());
    assert!(!ed.undo());
    assert_eq!(ed.document().pixel(0, 0), Some([7, 0, 0, 255]));
}
