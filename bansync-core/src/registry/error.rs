//! Registry error types

use crate::types::RoomId;
use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted store exists but does not parse. Never reset to empty.
    #[error("Malformed link store: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Cannot link room {0} to itself")]
    SelfLink(RoomId),

    #[error("Other error: {0}")]
    Other(String),
}
