//! Identifier types shared by the registry, the decider and the bot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a chat room (e.g. `!abc123:example.org`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Create a RoomId from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        RoomId(id.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        RoomId(s.to_string())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        RoomId(s)
    }
}

/// Fully qualified user identifier (e.g. `@alice:example.org`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id has the `@localpart:server` shape
    pub fn is_well_formed(&self) -> bool {
        match self.0.strip_prefix('@').and_then(|rest| rest.split_once(':')) {
            Some((local, server)) => !local.is_empty() && !server.is_empty(),
            None => false,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// Human-readable room alias, `#name:server`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomAlias {
    pub name: String,
    pub server: String,
}

impl RoomAlias {
    pub fn new(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
        }
    }

    /// Parse `#name:server`, splitting at the last colon
    pub fn parse(s: &str) -> Option<Self> {
        let (name, server) = s.strip_prefix('#')?.rsplit_once(':')?;
        if name.is_empty() || server.is_empty() {
            return None;
        }
        Some(Self::new(name, server))
    }
}

impl fmt::Display for RoomAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.name, self.server)
    }
}
