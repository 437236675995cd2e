use std::collections::VecDeque;

use crate::tracking::tracker::Snapshot;

/// Bounded decoupling buffer between detection and matching.
///
/// Overflow drops the incoming snapshot (drop-newest); older entries are
/// never displaced. Draining is capped per tick by the engine so matching
/// cost stays amortized under load.
pub struct SnapshotQueue {
    items: VecDeque<Snapshot>,
    capacity: usize,
}

impl SnapshotQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// `false` when the queue was full and the snapshot was dropped.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.items.len() >= self.capacity {
            return false;
        }
        self.items.push_back(snapshot);
        true
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
