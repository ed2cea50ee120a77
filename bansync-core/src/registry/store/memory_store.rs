//! In-memory link store for testing

use super::LinkStore;
use crate::registry::error::RegistryError;
use crate::registry::link::LinkDocument;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

fn handle_poison<T>(_err: PoisonError<T>) -> RegistryError {
    RegistryError::Other("Lock poisoned: a thread panicked while holding the lock".to_string())
}

/// In-memory link store (non-persistent). Clones share state, so a test can
/// keep a handle and inspect what the registry wrote.
#[derive(Clone, Default)]
pub struct MemoryStore {
    document: Arc<Mutex<Option<LinkDocument>>>,
    loads: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already persisted document
    pub fn with_document(document: LinkDocument) -> Self {
        let store = Self::new();
        if let Ok(mut slot) = store.document.lock() {
            *slot = Some(document);
        }
        store
    }

    /// Last saved document
    pub fn document(&self) -> Option<LinkDocument> {
        self.document.lock().ok().and_then(|doc| doc.clone())
    }

    /// Number of times the store was read
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of times the store was written
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following save fail with an IO error, or succeed again
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl LinkStore for MemoryStore {
    fn load(&self) -> Result<Option<LinkDocument>, RegistryError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.document.lock().map_err(handle_poison)?.clone())
    }

    fn save(&self, document: &LinkDocument) -> Result<(), RegistryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "link store is read-only").into());
        }
        *self.document.lock().map_err(handle_poison)? = Some(document.clone());
        Ok(())
    }
}
