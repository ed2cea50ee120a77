//! Recording transport
//!
//! Performs no network I/O. Every call is appended to an in-memory log that
//! tests (and the CLI `replay` command) read back. Alias resolution uses a
//! fixed table; joins and per-room actions can be made to fail.

use super::{Transport, TransportError};
use crate::types::{RoomAlias, RoomId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One recorded transport call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum TransportCall {
    SendText {
        room: RoomId,
        body: String,
    },
    Ban {
        room: RoomId,
        user: UserId,
        reason: Option<String>,
    },
    Unban {
        room: RoomId,
        user: UserId,
    },
    Join {
        room: RoomId,
    },
    ResolveAlias {
        alias: String,
    },
}

/// In-process [`Transport`] that records calls
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    aliases: HashMap<String, RoomId>,
    failing_rooms: HashSet<RoomId>,
    join_failures: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `alias` (written `#name:server`) resolve to `room`
    pub fn with_alias(mut self, alias: impl Into<String>, room: impl Into<RoomId>) -> Self {
        self.aliases.insert(alias.into(), room.into());
        self
    }

    /// Fail every ban and unban aimed at `room`
    pub fn with_failing_room(mut self, room: impl Into<RoomId>) -> Self {
        self.failing_rooms.insert(room.into());
        self
    }

    /// Fail the next `count` join attempts
    pub fn with_join_failures(self, count: usize) -> Self {
        self.join_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Everything recorded so far, in call order
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Drain the log
    pub fn take_calls(&self) -> Vec<TransportCall> {
        self.calls
            .lock()
            .map(|mut calls| std::mem::take(&mut *calls))
            .unwrap_or_default()
    }

    /// Bodies of every text message sent to `room`
    pub fn messages_to(&self, room: &RoomId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::SendText { room: r, body } if &r == room => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TransportCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check_room(&self, room: &RoomId) -> Result<(), TransportError> {
        if self.failing_rooms.contains(room) {
            return Err(TransportError::Request(format!("room {} unavailable", room)));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, room: &RoomId, body: &str) -> Result<(), TransportError> {
        self.record(TransportCall::SendText {
            room: room.clone(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn ban(
        &self,
        room: &RoomId,
        user: &UserId,
        reason: Option<&str>,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Ban {
            room: room.clone(),
            user: user.clone(),
            reason: reason.map(str::to_string),
        });
        self.check_room(room)
    }

    async fn unban(&self, room: &RoomId, user: &UserId) -> Result<(), TransportError> {
        self.record(TransportCall::Unban {
            room: room.clone(),
            user: user.clone(),
        });
        self.check_room(room)
    }

    async fn join(&self, room: &RoomId) -> Result<(), TransportError> {
        self.record(TransportCall::Join { room: room.clone() });
        let remaining = self.join_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.join_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::JoinFailed {
                room: room.to_string(),
                reason: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    async fn resolve_alias(&self, alias: &RoomAlias) -> Result<RoomId, TransportError> {
        let key = alias.to_string();
        self.record(TransportCall::ResolveAlias { alias: key.clone() });
        self.aliases
            .get(&key)
            .cloned()
            .ok_or(TransportError::AliasNotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let transport = RecordingTransport::new();
        let room = RoomId::from("!a:x");
        let user = UserId::from("@u:x");

        transport.ban(&room, &user, Some("spam")).await.unwrap();
        transport.unban(&room, &user).await.unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::Ban {
                    room: room.clone(),
                    user: user.clone(),
                    reason: Some("spam".to_string()),
                },
                TransportCall::Unban { room, user },
            ]
        );
    }

    #[tokio::test]
    async fn test_alias_table() {
        let transport = RecordingTransport::new().with_alias("#mods:x", "!m:x");

        let resolved = transport
            .resolve_alias(&RoomAlias::new("mods", "x"))
            .await
            .unwrap();
        assert_eq!(resolved, RoomId::from("!m:x"));

        let err = transport
            .resolve_alias(&RoomAlias::new("other", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::AliasNotFound(_)));
    }

    #[tokio::test]
    async fn test_join_failures_are_consumed() {
        let transport = RecordingTransport::new().with_join_failures(1);
        let room = RoomId::from("!a:x");

        assert!(transport.join(&room).await.is_err());
        assert!(transport.join(&room).await.is_ok());
        assert_eq!(transport.take_calls().len(), 2);
        assert!(transport.calls().is_empty());
    }
}
