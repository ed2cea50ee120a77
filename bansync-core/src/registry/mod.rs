//! Link Registry
//!
//! In-memory set of link groups backed by a [`LinkStore`]. The registry owns
//! every group; reads hand out copies so nothing can mutate link state
//! without going through a persisting operation.
//!
//! ## Lifecycle
//!
//! `Unloaded -> Loaded`, one way. Operations issued before [`LinkRegistry::load`]
//! log a warning and do nothing: lookups return an empty list, `link` reports
//! [`LinkOutcome::NotLoaded`] and `unlink` returns `false`. None of them touch
//! the store.
//!
//! ## Grouping
//!
//! A room belongs to at most one group. Linking two rooms that already sit in
//! different groups merges those groups, so links are N-way and transitive.

pub mod error;
pub mod link;
pub mod store;

pub use error::{RegistryError, RegistryResult};
pub use link::{LinkDocument, LinkGroup};
pub use store::{JsonFileStore, LinkStore, MemoryStore};

use crate::types::RoomId;
use tracing::{debug, info, warn};

/// What a call to [`LinkRegistry::link_channels`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Neither room was linked; a new group was created
    Created,
    /// One room joined the other's existing group
    Extended,
    /// Both rooms were linked elsewhere; their groups were merged
    Merged,
    /// Both rooms were already in the same group
    AlreadyLinked,
    /// The registry has not been loaded; nothing happened
    NotLoaded,
}

impl LinkOutcome {
    /// Whether link state changed
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Extended | Self::Merged)
    }
}

/// Durable registry of link groups
pub struct LinkRegistry<S: LinkStore = JsonFileStore> {
    store: S,
    groups: Vec<LinkGroup>,
    loaded: bool,
}

impl<S: LinkStore> LinkRegistry<S> {
    /// Create an unloaded registry over `store`
    pub fn new(store: S) -> Self {
        Self {
            store,
            groups: Vec::new(),
            loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load link state from the store. Idempotent.
    ///
    /// A missing store initializes an empty registry and writes it out
    /// immediately. A malformed store is returned as an error and the
    /// registry stays unloaded.
    pub fn load(&mut self) -> RegistryResult<()> {
        if self.loaded {
            debug!("Link registry already loaded");
            return Ok(());
        }

        match self.store.load()? {
            Some(document) => {
                let read = document.links.len();
                let groups = normalize(document.links.clone());
                if groups != document.links {
                    warn!(
                        read,
                        kept = groups.len(),
                        "Normalized overlapping or inactive link groups"
                    );
                    self.commit(groups)?;
                } else {
                    self.groups = groups;
                }
            }
            None => self.commit(Vec::new())?,
        }
        self.loaded = true;

        info!(groups = self.groups.len(), "Link registry loaded");
        Ok(())
    }

    /// Every other member of the group containing `channel`
    pub fn get_linked_channels(&self, channel: &RoomId) -> Vec<RoomId> {
        if !self.loaded {
            warn!(room = %channel, "Link registry has not been loaded yet");
            return Vec::new();
        }

        self.groups
            .iter()
            .find(|group| group.contains(channel))
            .map(|group| group.others(channel))
            .unwrap_or_default()
    }

    /// Link two rooms, merging existing groups as needed, then persist
    pub fn link_channels(&mut self, a: &RoomId, b: &RoomId) -> RegistryResult<LinkOutcome> {
        if !self.loaded {
            warn!(room_a = %a, room_b = %b, "Link registry has not been loaded yet");
            return Ok(LinkOutcome::NotLoaded);
        }
        if a == b {
            return Err(RegistryError::SelfLink(a.clone()));
        }

        let mut groups = self.groups.clone();
        let outcome = match (position(&groups, a), position(&groups, b)) {
            (None, None) => {
                groups.push(LinkGroup::new(a.clone(), b.clone()));
                LinkOutcome::Created
            }
            (Some(i), None) => {
                groups[i].push(b.clone());
                LinkOutcome::Extended
            }
            (None, Some(j)) => {
                groups[j].push(a.clone());
                LinkOutcome::Extended
            }
            (Some(i), Some(j)) if i == j => LinkOutcome::AlreadyLinked,
            (Some(i), Some(j)) => {
                let absorbed = groups.remove(j);
                let target = if j < i { i - 1 } else { i };
                groups[target].absorb(absorbed);
                LinkOutcome::Merged
            }
        };

        self.commit(groups)?;
        info!(room_a = %a, room_b = %b, ?outcome, "Linked rooms");
        Ok(outcome)
    }

    /// Remove `channel` from every group, dropping groups that fall below two
    /// members. Returns whether the room was linked anywhere.
    pub fn unlink_channels(&mut self, channel: &RoomId) -> RegistryResult<bool> {
        if !self.loaded {
            warn!(room = %channel, "Link registry has not been loaded yet");
            return Ok(false);
        }

        let mut groups = self.groups.clone();
        let mut removed = false;
        for group in &mut groups {
            removed |= group.remove(channel);
        }
        groups.retain(LinkGroup::is_active);

        self.commit(groups)?;
        if removed {
            info!(room = %channel, "Unlinked room");
        }
        Ok(removed)
    }

    /// Snapshot of every group
    pub fn groups(&self) -> Vec<LinkGroup> {
        self.groups.clone()
    }

    /// Persist `groups`, then make them current. A failed save leaves the
    /// in-memory state untouched.
    fn commit(&mut self, groups: Vec<LinkGroup>) -> RegistryResult<()> {
        let document = LinkDocument { links: groups };
        self.store.save(&document)?;
        self.groups = document.links;
        Ok(())
    }
}

fn position(groups: &[LinkGroup], channel: &RoomId) -> Option<usize> {
    groups.iter().position(|group| group.contains(channel))
}

impl LinkRegistry<JsonFileStore> {
    /// Registry over a JSON file at `path`
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(JsonFileStore::new(path))
    }
}

/// Fold persisted groups into a set that honours the registry invariants:
/// no repeated members, at least two members per group, and no room in more
/// than one group.
fn normalize(groups: Vec<LinkGroup>) -> Vec<LinkGroup> {
    let mut merged: Vec<LinkGroup> = Vec::new();

    for group in groups {
        let group = group.deduplicated();
        if !group.is_active() {
            continue;
        }

        let overlapping: Vec<usize> = merged
            .iter()
            .enumerate()
            .filter(|(_, existing)| group.channels().iter().any(|c| existing.contains(c)))
            .map(|(i, _)| i)
            .collect();

        let Some((&first, rest)) = overlapping.split_first() else {
            merged.push(group);
            continue;
        };

        let mut absorbed: Vec<LinkGroup> = rest.iter().rev().map(|&i| merged.remove(i)).collect();
        absorbed.reverse();
        for other in absorbed {
            merged[first].absorb(other);
        }
        merged[first].absorb(group);
    }

    merged
}
