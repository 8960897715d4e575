//! History manager: linear undo/redo over full layer snapshots.
//!
//! DESIGN
//! ======
//! Every entry is a complete copy of the layer collection. Collections are
//! small (a handful of layers), so full snapshots are cheap and make undo
//! trivially correct. Recording after an undo discards the redo branch.
//! The oldest snapshot is evicted once the capacity is exceeded.
//!
//! The soft-lock marker is presence state, not document state: snapshots are
//! stored with `locked_by` cleared and comparisons ignore it.
//!
//! INVARIANTS
//! ==========
//! - There is always at least one snapshot.
//! - `pointer` is always a valid index into `snapshots`.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use tracing::debug;

use crate::layer::Layer;
use crate::notice::now_ms;

/// Immutable capture of the layer collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub layers: Vec<Layer>,
    /// Milliseconds since Unix epoch when the snapshot was taken.
    pub ts: i64,
}

fn normalized(layers: &[Layer]) -> Vec<Layer> {
    layers
        .iter()
        .cloned()
        .map(|mut l| {
            l.locked_by = None;
            l
        })
        .collect()
}

fn same_document(a: &[Layer], b: &[Layer]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            // Compare everything except the presence marker.
            Layer { locked_by: None, ..x.clone() } == Layer { locked_by: None, ..y.clone() }
        })
}

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Snapshot>,
    pointer: usize,
    capacity: usize,
}

impl History {
    /// Start a history whose only entry is `initial`.
    #[must_use]
    pub fn new(initial: &[Layer], capacity: usize) -> Self {
        Self {
            snapshots: vec![Snapshot { layers: normalized(initial), ts: now_ms() }],
            pointer: 0,
            capacity: capacity.max(1),
        }
    }

    /// Append `layers` as a new snapshot unless it equals the current one.
    ///
    /// Returns `true` when a snapshot was appended.
    pub fn record(&mut self, layers: &[Layer]) -> bool {
        if same_document(&self.snapshots[self.pointer].layers, layers) {
            return false;
        }
        self.snapshots.truncate(self.pointer + 1);
        self.snapshots.push(Snapshot { layers: normalized(layers), ts: now_ms() });
        self.pointer = self.snapshots.len() - 1;

        if self.snapshots.len() > self.capacity {
            self.snapshots.remove(0);
            self.pointer -= 1;
            debug!(capacity = self.capacity, "history full; evicted oldest snapshot");
        }
        debug!(pointer = self.pointer, len = self.snapshots.len(), "history recorded");
        true
    }

    /// Step back one snapshot. `None` at the oldest snapshot.
    pub fn undo(&mut self) -> Option<&[Layer]> {
        if self.pointer == 0 {
            return None;
        }
        self.pointer -= 1;
        Some(&self.snapshots[self.pointer].layers)
    }

    /// Step forward one snapshot. `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<&[Layer]> {
        if self.pointer + 1 >= self.snapshots.len() {
            return None;
        }
        self.pointer += 1;
        Some(&self.snapshots[self.pointer].layers)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.snapshots.len()
    }

    /// Snapshot at the current pointer.
    #[must_use]
    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.pointer]
    }

    #[must_use]
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always `false`; a history holds at least its initial snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
