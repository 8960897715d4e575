//! In-process fan-out channel shared by every editor in a session.
//!
//! Each connected peer owns a bounded mpsc receiver. Publishing clones the
//! event into every other peer's sender with `try_send`: a full or closed
//! channel drops that copy, the publisher never waits.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ChatMessage, CollabError, CollabEvent, Collaborator, MAX_CHAT_LEN};
use crate::layer::{LayerId, LayerPatch};
use crate::notice::now_ms;

/// Per-peer inbound queue depth.
pub const PEER_CHANNEL_CAPACITY: usize = 256;

/// Shared collaboration channel. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct CollabBus {
    peers: Arc<Mutex<HashMap<Uuid, mpsc::Sender<CollabEvent>>>>,
}

impl CollabBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `user` on the bus. The returned receiver yields every event
    /// published by other peers.
    #[must_use]
    pub fn connect(&self, user: Collaborator) -> (CollabPeer, mpsc::Receiver<CollabEvent>) {
        let (tx, rx) = mpsc::channel(PEER_CHANNEL_CAPACITY);
        self.peers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(user.id, tx);
        debug!(user_id = %user.id, "peer connected to collab bus");
        (CollabPeer { bus: self.clone(), me: user }, rx)
    }

    /// Number of connected peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Deliver `event` to every peer except `from`. Returns how many copies
    /// were queued.
    fn publish(&self, from: Uuid, event: &CollabEvent) -> usize {
        let peers = self
            .peers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut delivered = 0;
        for (peer_id, tx) in peers.iter() {
            if *peer_id == from {
                continue;
            }
            // Best-effort: a full or closed queue skips this peer.
            if tx.try_send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(%peer_id, kind = event.kind(), "collab event dropped");
            }
        }
        delivered
    }

    fn disconnect(&self, id: &Uuid) {
        self.peers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(id);
    }
}

/// One editor's handle on the bus: its identity plus outbound operations.
///
/// Dropping the handle disconnects it without announcing a `leave`.
pub struct CollabPeer {
    bus: CollabBus,
    me: Collaborator,
}

impl CollabPeer {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.me.id
    }

    #[must_use]
    pub fn me(&self) -> &Collaborator {
        &self.me
    }

    /// Announce this peer to everyone else.
    pub fn join(&self) -> usize {
        info!(user_id = %self.me.id, name = %self.me.name, "joining collaboration session");
        self.bus.publish(self.me.id, &CollabEvent::Join { user: self.me.clone() })
    }

    /// Announce departure. The peer stays connected until dropped.
    pub fn leave(&self) -> usize {
        info!(user_id = %self.me.id, "leaving collaboration session");
        self.bus.publish(self.me.id, &CollabEvent::Leave { user_id: self.me.id })
    }

    pub fn update_cursor(&mut self, x: f64, y: f64) -> usize {
        self.me.x = x;
        self.me.y = y;
        self.bus.publish(self.me.id, &CollabEvent::CursorMove { user_id: self.me.id, x, y })
    }

    /// Broadcast a layer mutation. A no-op when nobody else is listening.
    pub fn broadcast_layer_update(&self, layer_id: LayerId, updates: &LayerPatch) -> usize {
        self.bus.publish(
            self.me.id,
            &CollabEvent::LayerUpdate { layer_id, updates: updates.clone(), user_id: self.me.id },
        )
    }

    /// Publish a chat message and return it for the local transcript.
    ///
    /// # Errors
    ///
    /// Rejects blank or oversized messages before anything is sent.
    pub fn send_chat(&self, text: &str) -> Result<ChatMessage, CollabError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CollabError::EmptyMessage);
        }
        if text.chars().count() > MAX_CHAT_LEN {
            return Err(CollabError::MessageTooLong);
        }
        let message = ChatMessage {
            id: Uuid::new_v4(),
            user_id: self.me.id,
            user_name: self.me.name.clone(),
            user_color: self.me.color.clone(),
            text: text.to_owned(),
            timestamp: now_ms(),
        };
        self.bus.publish(self.me.id, &CollabEvent::ChatMessage { message: message.clone() });
        Ok(message)
    }
}

impl Drop for CollabPeer {
    fn drop(&mut self) {
        self.bus.disconnect(&self.me.id);
    }
}
