//! Presence: who else is editing, where their cursors are, the chat log,
//! and the soft-lock markers left by remote layer edits.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ChatMessage, Collaborator};
use crate::layer::LayerId;

// =============================================================================
// PRESENCE
// =============================================================================

/// Remote collaborators and chat history as seen by one peer.
#[derive(Debug, Clone)]
pub struct Presence {
    self_id: Uuid,
    collaborators: HashMap<Uuid, Collaborator>,
    messages: Vec<ChatMessage>,
}

impl Presence {
    #[must_use]
    pub fn new(self_id: Uuid) -> Self {
        Self { self_id, collaborators: HashMap::new(), messages: Vec::new() }
    }

    /// Record a join. Returns `true` when the joiner was not known before,
    /// meaning the local peer should announce itself back.
    pub fn join(&mut self, user: Collaborator) -> bool {
        if user.id == self.self_id {
            return false;
        }
        let id = user.id;
        let is_new = self.collaborators.insert(id, user).is_none();
        if is_new {
            info!(user_id = %id, "collaborator joined");
        }
        is_new
    }

    pub fn leave(&mut self, user_id: &Uuid) -> Option<Collaborator> {
        let removed = self.collaborators.remove(user_id);
        if removed.is_some() {
            info!(%user_id, "collaborator left");
        }
        removed
    }

    /// Move a known collaborator's cursor. Unknown ids are dropped.
    pub fn move_cursor(&mut self, user_id: &Uuid, x: f64, y: f64) -> bool {
        let Some(c) = self.collaborators.get_mut(user_id) else {
            debug!(%user_id, "cursor-move from unknown collaborator dropped");
            return false;
        };
        c.x = x;
        c.y = y;
        true
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn get(&self, user_id: &Uuid) -> Option<&Collaborator> {
        self.collaborators.get(user_id)
    }

    /// Remote collaborators, sorted by name for stable display.
    #[must_use]
    pub fn collaborators(&self) -> Vec<&Collaborator> {
        let mut list: Vec<&Collaborator> = self.collaborators.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        list
    }

    /// Chat log in arrival order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collaborators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collaborators.is_empty()
    }
}

// =============================================================================
// SOFT LOCKS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SoftLock {
    holder: Uuid,
    generation: u64,
    expires_at: Instant,
}

/// Timed "recently edited by" markers, one per layer.
///
/// Each mark gets a fresh generation. A clear scoped to an older generation
/// is ignored, so a newer remote edit is never unmarked early.
#[derive(Debug, Clone)]
pub struct SoftLocks {
    window: Duration,
    next_generation: u64,
    locks: HashMap<LayerId, SoftLock>,
}

impl SoftLocks {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { window, next_generation: 0, locks: HashMap::new() }
    }

    /// Mark `layer` as held by `holder` until `now + window`.
    pub fn mark(&mut self, layer: LayerId, holder: Uuid, now: Instant) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.locks.insert(layer, SoftLock { holder, generation, expires_at: now + self.window });
        debug!(%layer, %holder, generation, "soft lock set");
        generation
    }

    /// Clear the marker only if it still belongs to `generation`.
    pub fn clear_if_current(&mut self, layer: &LayerId, generation: u64) -> bool {
        match self.locks.get(layer) {
            Some(lock) if lock.generation == generation => {
                self.locks.remove(layer);
                debug!(%layer, generation, "soft lock cleared");
                true
            }
            _ => false,
        }
    }

    /// Remove every marker whose window has elapsed and return their layers.
    pub fn expire(&mut self, now: Instant) -> Vec<LayerId> {
        let due: Vec<(LayerId, u64)> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.expires_at <= now)
            .map(|(id, lock)| (*id, lock.generation))
            .collect();
        due.into_iter()
            .filter_map(|(id, generation)| self.clear_if_current(&id, generation).then_some(id))
            .collect()
    }

    /// Drop a layer's marker outright, e.g. when the layer is deleted.
    pub fn forget(&mut self, layer: &LayerId) {
        self.locks.remove(layer);
    }

    #[must_use]
    pub fn holder(&self, layer: &LayerId) -> Option<Uuid> {
        self.locks.get(layer).map(|l| l.holder)
    }

    /// Earliest pending expiry, for the event loop's sleep.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.locks.values().map(|l| l.expires_at).min()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
