use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a layer within one editing session.
/// Ids are handed out by an [`IdGen`] and never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(u32);

impl LayerId {
    /// Reserved ceiling. No live layer carries it.
    pub const MAX: LayerId = LayerId(u32::MAX);

    pub const fn new(raw: u32) -> Self {
        LayerId(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic layer id generator. Starts at 1 and only moves forward, even
/// when layers are removed or the whole scene is replaced, so a stale id in
/// history can never alias a newer layer.
#[derive(Debug, Clone)]
pub struct IdGen {
    next: u32,
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate a fresh id. The counter stops at [`LayerId::MAX`], which is
    /// never handed out twice in practice since sessions reject it on load.
    pub fn next_id(&mut self) -> LayerId {
        let id = LayerId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Record an id that entered the scene from elsewhere (history, load) so
    /// later allocations stay above it. Never lowers the floor.
    pub fn observe(&mut self, id: LayerId) {
        if id.0 >= self.next {
            self.next = id.0.saturating_add(1);
        }
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> LayerId {
        LayerId(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_from_one() {
        let mut ids = IdGen::new();
        assert_eq!(ids.next_id(), LayerId::new(1));
        assert_eq!(ids.next_id(), LayerId::new(2));
    }

    #[test]
    fn observe_never_lowers_the_floor() {
        let mut ids = IdGen::new();
        ids.observe(LayerId::new(9));
        assert_eq!(ids.peek(), LayerId::new(10));
        ids.observe(LayerId::new(3));
        assert_eq!(ids.next_id(), LayerId::new(10));
    }

    #[test]
    fn observing_the_ceiling_saturates() {
        let mut ids = IdGen::new();
        ids.observe(LayerId::MAX);
        assert_eq!(ids.peek(), LayerId::MAX);
        ids.observe(LayerId::new(u32::MAX - 1));
        assert_eq!(ids.peek(), LayerId::MAX);
    }
}
