//! Outbound action intents

use crate::types::{RoomId, UserId};
use serde::{Deserialize, Serialize};

/// An action the decider wants the transport to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionIntent {
    Ban {
        room: RoomId,
        user: UserId,
        reason: Option<String>,
    },
    Unban {
        room: RoomId,
        user: UserId,
    },
}

impl ActionIntent {
    /// Target room of the action
    pub fn room(&self) -> &RoomId {
        match self {
            ActionIntent::Ban { room, .. } | ActionIntent::Unban { room, .. } => room,
        }
    }

    pub fn user(&self) -> &UserId {
        match self {
            ActionIntent::Ban { user, .. } | ActionIntent::Unban { user, .. } => user,
        }
    }

    /// Short label, used for logs and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            ActionIntent::Ban { .. } => "ban",
            ActionIntent::Unban { .. } => "unban",
        }
    }
}
