//! Link store
//!
//! Abstract durable storage for the link registry. Every save is a full
//! overwrite of the document; there is no incremental log.

use super::error::RegistryError;
use super::link::LinkDocument;

pub mod file_store;
pub mod memory_store;

pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;

/// Durable backing for a [`LinkRegistry`](super::LinkRegistry)
pub trait LinkStore: Send + Sync {
    /// Read the persisted document, `None` when nothing has been stored yet
    fn load(&self) -> Result<Option<LinkDocument>, RegistryError>;

    /// Replace the persisted document
    fn save(&self, document: &LinkDocument) -> Result<(), RegistryError>;
}
