//! Persistence boundary: session records and their MessagePack codec.
//!
//! The storage backend itself lives outside the core. It hands back a
//! [`SessionState`] (or nothing) on load and receives one on save.

use crate::config::{MAX_DOC_SIDE, MIN_DOC_SIDE};
use crate::geom::IRect;
use crate::id::LayerId;
use crate::model::{Layer, LayerMeta};
use crate::raster::Raster;
use crate::viewport::ViewState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to encode session: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode session: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("corrupt session record: {0}")]
    Corrupt(String),
}

/// Serializable snapshot of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub id: LayerId,
    pub dest: IRect,
    pub src: IRect,
    #[serde(default)]
    pub z: i32,
    #[serde(default)]
    pub meta: Option<LayerMeta>,
    pub pixels: Raster,
}

impl LayerRecord {
    pub fn from_layer(layer: &Layer) -> Self {
        Self {
            id: layer.id,
            dest: layer.dest,
            src: layer.src,
            z: layer.z,
            meta: layer.meta.clone(),
            pixels: (*layer.pixels).clone(),
        }
    }

    pub fn into_layer(self) -> Layer {
        let mut layer = Layer {
            id: self.id,
            pixels: Arc::new(self.pixels),
            src: self.src,
            dest: self.dest,
            z: self.z,
            meta: self.meta,
        };
        layer.normalize();
        layer
    }

    fn validate(&self) -> Result<(), PersistError> {
        if self.id == LayerId::MAX {
            return Err(PersistError::Corrupt(format!("layer id {} is reserved", self.id)));
        }
        let (bw, bh) = (self.pixels.width() as i32, self.pixels.height() as i32);
        if bw == 0 || bh == 0 {
            return Err(PersistError::Corrupt(format!("layer {} has no pixels", self.id)));
        }
        let s = self.src;
        if s.x < 0 || s.y < 0 || s.w < 1 || s.h < 1 || s.right() > bw || s.bottom() > bh {
            return Err(PersistError::Corrupt(format!(
                "layer {} source rect {s} outside {bw}×{bh} buffer",
                self.id
            )));
        }
        Ok(())
    }
}

/// Everything the core needs to resume a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub document: Raster,
    #[serde(default)]
    pub view: Option<ViewState>,
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
}

impl SessionState {
    /// Check what the type system cannot: a document inside
    /// `MIN_DOC_SIDE..=MAX_DOC_SIDE`, layer sources inside their buffers,
    /// and no two records sharing an id.
    pub fn validate(&self) -> Result<(), PersistError> {
        let (w, h) = (self.document.width(), self.document.height());
        if w == 0 || h == 0 {
            return Err(PersistError::Corrupt("empty document".to_string()));
        }
        let sides = MIN_DOC_SIDE..=MAX_DOC_SIDE;
        if !sides.contains(&w) || !sides.contains(&h) {
            return Err(PersistError::Corrupt(format!(
                "document {w}×{h} outside {MIN_DOC_SIDE}..={MAX_DOC_SIDE}"
            )));
        }
        let mut seen = HashSet::with_capacity(self.layers.len());
        for record in &self.layers {
            record.validate()?;
            if !seen.insert(record.id) {
                return Err(PersistError::Corrupt(format!("layer id {} appears twice", record.id)));
            }
        }
        Ok(())
    }
}

/// Encode as MessagePack with named fields.
pub fn encode(state: &SessionState) -> Result<Vec<u8>, PersistError> {
    Ok(rmp_serde::to_vec_named(state)?)
}

/// Decode and validate a session produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<SessionState, PersistError> {
    let state: SessionState = rmp_serde::from_slice(bytes)?;
    state.validate()?;
    Ok(state)
}

/// A place sessions are saved to and loaded from.
pub trait SessionStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<SessionState>, PersistError>;

    fn save(&mut self, state: &SessionState) -> Result<(), PersistError>;
}

/// In-memory store holding the encoded bytes of the last save.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with raw bytes (possibly corrupt).
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<SessionState>, PersistError> {
        self.bytes.as_deref().map(decode).transpose()
    }

    fn save(&mut self, state: &SessionState) -> Result<(), PersistError> {
        self.bytes = Some(encode(state)?);
        Ok(())
    }
}
