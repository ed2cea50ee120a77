//! Link groups and their persisted document form

use crate::types::RoomId;
use serde::{Deserialize, Serialize};

/// A set of rooms whose bans are kept in sync
///
/// Member order is insertion order and only matters for deterministic
/// iteration. A group with fewer than two members is not an active link and
/// never survives inside a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGroup {
    channels: Vec<RoomId>,
}

impl LinkGroup {
    /// Create a group linking two rooms
    pub fn new(a: RoomId, b: RoomId) -> Self {
        Self {
            channels: vec![a, b],
        }
    }

    /// Create a group from an arbitrary member list, as read from storage
    pub fn from_channels(channels: Vec<RoomId>) -> Self {
        Self { channels }
    }

    /// Members in insertion order
    pub fn channels(&self) -> &[RoomId] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, room: &RoomId) -> bool {
        self.channels.contains(room)
    }

    /// Whether the group still represents a link
    pub fn is_active(&self) -> bool {
        self.channels.len() >= 2
    }

    /// Every member except `room`, in group order
    pub fn others(&self, room: &RoomId) -> Vec<RoomId> {
        self.channels
            .iter()
            .filter(|c| *c != room)
            .cloned()
            .collect()
    }

    /// Append a member unless it is already present
    pub(crate) fn push(&mut self, room: RoomId) -> bool {
        if self.contains(&room) {
            return false;
        }
        self.channels.push(room);
        true
    }

    /// Append every member of `other` not already present, keeping its order
    pub(crate) fn absorb(&mut self, other: LinkGroup) {
        for room in other.channels {
            self.push(room);
        }
    }

    /// Remove every occurrence of `room`, returning whether it was present
    pub(crate) fn remove(&mut self, room: &RoomId) -> bool {
        let before = self.channels.len();
        self.channels.retain(|c| c != room);
        self.channels.len() != before
    }

    /// Drop repeated members, keeping first occurrences
    pub(crate) fn deduplicated(self) -> Self {
        let mut group = Self {
            channels: Vec::with_capacity(self.channels.len()),
        };
        group.absorb(self);
        group
    }
}

/// On-disk layout: `{ "links": [ { "channels": [...] }, ... ] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDocument {
    pub links: Vec<LinkGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str) -> RoomId {
        RoomId::from(id)
    }

    #[test]
    fn test_others_excludes_self_and_keeps_order() {
        let mut group = LinkGroup::new(room("A"), room("B"));
        group.push(room("C"));

        assert_eq!(group.others(&room("B")), vec![room("A"), room("C")]);
        assert_eq!(group.others(&room("Z")).len(), 3);
    }

    #[test]
    fn test_push_ignores_duplicates() {
        let mut group = LinkGroup::new(room("A"), room("B"));
        assert!(!group.push(room("A")));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_remove_and_activity() {
        let mut group = LinkGroup::new(room("A"), room("B"));
        assert!(group.remove(&room("A")));
        assert!(!group.remove(&room("A")));
        assert!(!group.is_active());
    }

    #[test]
    fn test_deduplicated() {
        let group =
            LinkGroup::from_channels(vec![room("A"), room("B"), room("A"), room("C")]).deduplicated();
        assert_eq!(group.channels(), &[room("A"), room("B"), room("C")]);
    }

    #[test]
    fn test_document_layout() {
        let doc = LinkDocument {
            links: vec![LinkGroup::new(room("!a:x"), room("!b:y"))],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "links": [ { "channels": ["!a:x", "!b:y"] } ] })
        );
    }
}
