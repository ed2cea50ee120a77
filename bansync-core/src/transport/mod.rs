//! Transport Trait - seam to the chat protocol client
//!
//! The bot never talks to the network directly. Everything that crosses the
//! protocol boundary goes through [`Transport`], so the dispatch logic can be
//! driven by a real client or by [`RecordingTransport`] in tests and replays.

use crate::types::{RoomAlias, RoomId, UserId};
use async_trait::async_trait;
use thiserror::Error;

pub mod recording;

pub use recording::{RecordingTransport, TransportCall};

/// Errors reported by a transport implementation
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Room alias not found: {0}")]
    AliasNotFound(String),

    #[error("Failed to join room {room}: {reason}")]
    JoinFailed { room: String, reason: String },

    #[error("Request failed: {0}")]
    Request(String),
}

/// Actions the bot needs from the chat protocol client
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post a plain text message
    async fn send_text(&self, room: &RoomId, body: &str) -> Result<(), TransportError>;

    async fn ban(
        &self,
        room: &RoomId,
        user: &UserId,
        reason: Option<&str>,
    ) -> Result<(), TransportError>;

    async fn unban(&self, room: &RoomId, user: &UserId) -> Result<(), TransportError>;

    async fn join(&self, room: &RoomId) -> Result<(), TransportError>;

    /// Resolve `#name:server` to a room id
    async fn resolve_alias(&self, alias: &RoomAlias) -> Result<RoomId, TransportError>;
}
