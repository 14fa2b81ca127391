//! Dual-track undo/redo.
//!
//! The document background is versioned by whole-raster snapshots; the layer
//! collection by structured actions that know how to invert themselves.
//! [`EditHistory`] pops one entry from each track per undo or redo. An empty
//! track is a no-op pop, so a gesture that touched both tracks pushes one
//! entry to each and is reversed by a single undo.

use crate::scene::SceneModel;
use lp_core::id::LayerId;
use lp_core::model::Layer;
use lp_core::raster::Raster;
use std::collections::VecDeque;
use std::sync::Arc;

// ─── Raster track ────────────────────────────────────────────────────────

/// Bounded stack of document snapshots. The top entry is always the
/// current document, so undo needs at least two entries.
#[derive(Debug, Clone)]
pub struct RasterHistory {
    stack: VecDeque<Arc<Raster>>,
    redo: Vec<Arc<Raster>>,
    limit: usize,
}

impl RasterHistory {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            stack: VecDeque::with_capacity(limit + 1),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Push the current document. Evicts the oldest beyond the limit and
    /// clears redo.
    pub fn push(&mut self, snapshot: Arc<Raster>) {
        self.stack.push_back(snapshot);
        while self.stack.len() > self.limit {
            self.stack.pop_front();
        }
        self.redo.clear();
    }

    /// The snapshot matching the live document.
    pub fn current(&self) -> Option<&Arc<Raster>> {
        self.stack.back()
    }

    pub fn can_undo(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Pop the current snapshot onto redo and return the one before it.
    pub fn undo(&mut self) -> Option<Arc<Raster>> {
        if !self.can_undo() {
            return None;
        }
        let current = self.stack.pop_back()?;
        self.redo.push(current);
        self.stack.back().cloned()
    }

    pub fn redo(&mut self) -> Option<Arc<Raster>> {
        let next = self.redo.pop()?;
        self.stack.push_back(Arc::clone(&next));
        Some(next)
    }

    /// Drop everything and start over from `current`.
    pub fn reset(&mut self, current: Arc<Raster>) {
        self.stack.clear();
        self.redo.clear();
        self.stack.push_back(current);
    }
}

// ─── Structured track ────────────────────────────────────────────────────

/// A reversible change to the layer collection.
#[derive(Debug, Clone)]
pub enum LayerAction {
    /// A layer was added. Undo removes it; redo re-adds it with its id.
    Add { layer: Layer },
    /// A layer was removed from `index`. Undo puts it back there.
    Remove { layer: Layer, index: usize },
    /// One layer changed. Undo applies `before`, redo `after`.
    Modify {
        id: LayerId,
        before: Layer,
        after: Layer,
    },
    /// The whole collection was swapped.
    Replace { before: Vec<Layer>, after: Vec<Layer> },
}

impl LayerAction {
    pub fn kind(&self) -> &'static str {
        match self {
            LayerAction::Add { .. } => "add",
            LayerAction::Remove { .. } => "remove",
            LayerAction::Modify { .. } => "modify",
            LayerAction::Replace { .. } => "replace",
        }
    }

    fn revert(&self, scene: &mut SceneModel) {
        match self {
            LayerAction::Add { layer } => {
                scene.remove(layer.id);
            }
            LayerAction::Remove { layer, index } => {
                scene.insert_layer_at(*index, layer.clone());
            }
            LayerAction::Modify { id, before, .. } => {
                if !scene.restore_state(*id, before) {
                    log::warn!("undo modify: layer {id} is gone");
                }
            }
            LayerAction::Replace { before, .. } => scene.replace_all(before.clone()),
        }
    }

    fn reapply(&self, scene: &mut SceneModel) {
        match self {
            LayerAction::Add { layer } => {
                scene.insert_layer(layer.clone());
            }
            LayerAction::Remove { layer, .. } => {
                scene.remove(layer.id);
            }
            LayerAction::Modify { id, after, .. } => {
                if !scene.restore_state(*id, after) {
                    log::warn!("redo modify: layer {id} is gone");
                }
            }
            LayerAction::Replace { after, .. } => scene.replace_all(after.clone()),
        }
    }
}

/// Unbounded stack of [`LayerAction`]s.
#[derive(Debug, Clone, Default)]
pub struct LayerHistory {
    undo_stack: Vec<LayerAction>,
    redo_stack: Vec<LayerAction>,
}

impl LayerHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action that has already been applied. Clears redo.
    pub fn push(&mut self, action: LayerAction) {
        self.undo_stack.push(action);
        self.redo_stack.clear();
    }

    pub fn undo(&mut self, scene: &mut SceneModel) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };
        action.revert(scene);
        self.redo_stack.push(action);
        true
    }

    pub fn redo(&mut self, scene: &mut SceneModel) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        action.reapply(scene);
        self.undo_stack.push(action);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

// ─── Coordinated history ─────────────────────────────────────────────────

/// What one undo or redo step changed.
#[derive(Debug, Clone, Default)]
pub struct UndoOutcome {
    /// The document to show, if the raster track moved.
    pub raster: Option<Arc<Raster>>,
    /// Whether the structured track moved.
    pub layers_changed: bool,
}

impl UndoOutcome {
    pub fn is_noop(&self) -> bool {
        self.raster.is_none() && !self.layers_changed
    }
}

#[derive(Debug, Clone)]
pub struct EditHistory {
    pub raster: RasterHistory,
    pub layers: LayerHistory,
}

impl EditHistory {
    pub fn new(raster_limit: usize) -> Self {
        Self {
            raster: RasterHistory::new(raster_limit),
            layers: LayerHistory::new(),
        }
    }

    pub fn push_raster(&mut self, snapshot: Arc<Raster>) {
        self.raster.push(snapshot);
        log::debug!(
            "raster push ({}/{})",
            self.raster.len(),
            self.raster.limit()
        );
    }

    pub fn push_action(&mut self, action: LayerAction) {
        log::debug!("layer push: {}", action.kind());
        self.layers.push(action);
    }

    /// One logical undo: pops both tracks, each a no-op when empty.
    pub fn undo(&mut self, scene: &mut SceneModel) -> UndoOutcome {
        let outcome = UndoOutcome {
            raster: self.raster.undo(),
            layers_changed: self.layers.undo(scene),
        };
        log::debug!(
            "undo: raster={} layers={}",
            outcome.raster.is_some(),
            outcome.layers_changed
        );
        outcome
    }

    pub fn redo(&mut self, scene: &mut SceneModel) -> UndoOutcome {
        let outcome = UndoOutcome {
            raster: self.raster.redo(),
            layers_changed: self.layers.redo(scene),
        };
        log::debug!(
            "redo: raster={} layers={}",
            outcome.raster.is_some(),
            outcome.layers_changed
        );
        outcome
    }

    /// Enabled when either track can move.
    pub fn can_undo(&self) -> bool {
        self.raster.can_undo() || self.layers.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.raster.can_redo() || self.layers.can_redo()
    }

    /// Forget everything; `current` becomes the only raster entry.
    pub fn reset(&mut self, current: Arc<Raster>) {
        self.raster.reset(current);
        self.layers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_core::geom::IRect;
    use pretty_assertions::assert_eq;

    fn snap(v: u8) -> Arc<Raster> {
        Arc::new(Raster::filled(1, 1, [v, v, v, 255]))
    }

    fn value(r: &Arc<Raster>) -> u8 {
        r.pixel(0, 0).map(|p| p[0]).unwrap_or_default()
    }

    // ─── Raster track ────────────────────────────────────────────────────

    #[test]
    fn single_entry_cannot_undo() {
        let mut h = RasterHistory::new(5);
        h.push(snap(0));
        assert!(!h.can_undo());
        assert!(h.undo().is_none());
    }

    #[test]
    fn undo_returns_previous_and_redo_returns_popped() {
        let mut h = RasterHistory::new(5);
        h.push(snap(0));
        h.push(snap(1));
        assert_eq!(h.undo().map(|r| value(&r)), Some(0));
        assert_eq!(h.redo().map(|r| value(&r)), Some(1));
        assert!(!h.can_redo());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = RasterHistory::new(3);
        for v in 0..5 {
            h.push(snap(v));
        }
        assert_eq!(h.len(), 3);
        let mut seen = Vec::new();
        while let Some(r) = h.undo() {
            seen.push(value(&r));
        }
        assert_eq!(seen, vec![3, 2]);
    }

    #[test]
    fn push_clears_raster_redo() {
        let mut h = RasterHistory::new(5);
        h.push(snap(0));
        h.push(snap(1));
        h.undo();
        h.push(snap(2));
        assert!(!h.can_redo());
    }

    // ─── Structured track ────────────────────────────────────────────────

    #[test]
    fn modify_roundtrip() {
        let mut scene = SceneModel::default();
        let id = scene.add_layer(Raster::new(10, 10), 0, 0);
        let before = scene.get(id).unwrap().clone();
        scene.set_position(id, 40, 50);
        let after = scene.get(id).unwrap().clone();

        let mut h = LayerHistory::new();
        h.push(LayerAction::Modify { id, before, after });
        assert!(h.undo(&mut scene));
        assert_eq!(scene.get(id).unwrap().dest, IRect::new(0, 0, 10, 10));
        assert!(h.redo(&mut scene));
        assert_eq!(scene.get(id).unwrap().dest, IRect::new(40, 50, 10, 10));
    }

    #[test]
    fn remove_undo_restores_original_index() {
        let mut scene = SceneModel::default();
        let a = scene.add_layer(Raster::new(1, 1), 0, 0);
        let b = scene.add_layer(Raster::new(1, 1), 0, 0);
        let c = scene.add_layer(Raster::new(1, 1), 0, 0);
        let (index, layer) = scene.remove(b).unwrap();

        let mut h = LayerHistory::new();
        h.push(LayerAction::Remove { layer, index });
        h.undo(&mut scene);
        let ids: Vec<LayerId> = scene.layers().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn replace_keeps_snapshot_ids() {
        let mut scene = SceneModel::default();
        scene.add_layer(Raster::new(1, 1), 0, 0);
        scene.add_layer(Raster::new(1, 1), 0, 0);
        let before = scene.layers().to_vec();
        scene.clear();

        let mut h = LayerHistory::new();
        h.push(LayerAction::Replace {
            before,
            after: Vec::new(),
        });
        h.undo(&mut scene);
        let ids: Vec<u32> = scene.layers().iter().map(|l| l.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(scene.peek_id(), LayerId::new(3));
    }

    // ─── Coordination ────────────────────────────────────────────────────

    #[test]
    fn one_undo_pops_both_tracks() {
        let mut scene = SceneModel::default();
        let mut h = EditHistory::new(25);
        h.push_raster(snap(0));
        let id = scene.add_layer(Raster::new(1, 1), 0, 0);
        h.push_raster(snap(1));
        h.push_action(LayerAction::Add {
            layer: scene.get(id).unwrap().clone(),
        });

        let out = h.undo(&mut scene);
        assert_eq!(out.raster.map(|r| value(&r)), Some(0));
        assert!(out.layers_changed);
        assert!(scene.is_empty());
        assert!(!h.can_undo());
        assert!(h.can_redo());
    }

    #[test]
    fn empty_track_pop_is_noop() {
        let mut scene = SceneModel::default();
        let mut h = EditHistory::new(25);
        h.push_raster(snap(0));
        let out = h.undo(&mut scene);
        assert!(out.is_noop());
        assert!(!h.can_undo());
    }
}
