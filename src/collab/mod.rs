//! Collaboration bus: wire events, the in-process fan-out channel, and
//! presence bookkeeping.
//!
//! DESIGN
//! ======
//! Collaboration is local: peers are editors sharing one `CollabBus`
//! (tabs of one browser session, or tasks of one process). The bus never
//! holds document state. It only fans out copies of events to every other
//! connected peer, best-effort, in delivery order.
//!
//! Inbound events are interpreted by the editor: presence events update
//! `Presence`, layer updates are applied last-write-wins and mark the layer
//! with a short-lived soft lock (`SoftLocks`).

pub mod bus;
pub mod presence;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use bus::{CollabBus, CollabPeer};
pub use presence::{Presence, SoftLocks};

use crate::layer::{LayerId, LayerPatch};
use crate::notice::ErrorCode;

/// Presence colors handed out to new collaborators.
pub const COLLABORATOR_COLORS: [&str; 5] = ["#F43F5E", "#3B82F6", "#10B981", "#F59E0B", "#8B5CF6"];

/// Longest chat message accepted, in characters.
pub const MAX_CHAT_LEN: usize = 2000;

// =============================================================================
// TYPES
// =============================================================================

/// A participant in the editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: Uuid,
    pub name: String,
    /// Hex color used for the cursor and soft-lock outline.
    pub color: String,
    /// Last known cursor position, canvas percent.
    pub x: f64,
    pub y: f64,
}

impl Collaborator {
    /// A fresh local identity with a generated name and color.
    #[must_use]
    pub fn random() -> Self {
        let mut rng = rand::rng();
        let suffix: u32 = rng.random_range(0..1000);
        let color = COLLABORATOR_COLORS.choose(&mut rng).copied().unwrap_or(COLLABORATOR_COLORS[0]);
        Self { id: Uuid::new_v4(), name: format!("Designer_{suffix}"), color: color.to_owned(), x: 0.0, y: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    /// Sender's presence color, so the chat log renders without a lookup.
    pub user_color: String,
    pub text: String,
    /// Milliseconds since Unix epoch.
    pub timestamp: i64,
}

/// Everything that crosses the collaboration channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CollabEvent {
    Join { user: Collaborator },
    Leave { user_id: Uuid },
    CursorMove { user_id: Uuid, x: f64, y: f64 },
    LayerUpdate { layer_id: LayerId, updates: LayerPatch, user_id: Uuid },
    ChatMessage { message: ChatMessage },
}

impl CollabEvent {
    /// Wire name of the event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::CursorMove { .. } => "cursor-move",
            Self::LayerUpdate { .. } => "layer-update",
            Self::ChatMessage { .. } => "chat-message",
        }
    }

    /// Id of the collaborator that produced the event.
    #[must_use]
    pub fn origin(&self) -> Uuid {
        match self {
            Self::Join { user } => user.id,
            Self::Leave { user_id } | Self::CursorMove { user_id, .. } | Self::LayerUpdate { user_id, .. } => *user_id,
            Self::ChatMessage { message } => message.user_id,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    #[error("chat message is empty")]
    EmptyMessage,
    #[error("chat message exceeds {} characters", MAX_CHAT_LEN)]
    MessageTooLong,
}

impl ErrorCode for CollabError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "E_CHAT_EMPTY",
            Self::MessageTooLong => "E_CHAT_TOO_LONG",
        }
    }
}
