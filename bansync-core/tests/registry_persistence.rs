//! Persistence and invariant tests for the link registry
//!
//! These run against the JSON file store so every check covers the on-disk
//! layout as well as the in-memory state.

use bansync_core::registry::{JsonFileStore, LinkRegistry, RegistryError};
use bansync_core::{LinkOutcome, RoomId};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use tempfile::tempdir;

fn room(id: &str) -> RoomId {
    RoomId::from(id)
}

fn open(path: &std::path::Path) -> LinkRegistry<JsonFileStore> {
    let mut registry = LinkRegistry::open(path);
    registry.load().unwrap();
    registry
}

/// Group membership as comparable sets, ignoring order
fn membership(registry: &LinkRegistry<JsonFileStore>) -> BTreeSet<BTreeSet<RoomId>> {
    registry
        .groups()
        .iter()
        .map(|g| g.channels().iter().cloned().collect())
        .collect()
}

#[test]
fn test_first_load_creates_store_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");

    let _registry = open(&path);

    let contents = fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json, serde_json::json!({ "links": [] }));
}

#[test]
fn test_link_survives_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut registry = open(&path);
    registry.link_channels(&room("A"), &room("B")).unwrap();
    drop(registry);

    let reloaded = open(&path);
    assert_eq!(reloaded.get_linked_channels(&room("A")), vec![room("B")]);
    assert_eq!(reloaded.get_linked_channels(&room("B")), vec![room("A")]);
}

#[test]
fn test_chained_links_form_one_group() {
    let dir = tempdir().unwrap();
    let mut registry = open(&dir.path().join("store.json"));

    registry.link_channels(&room("A"), &room("B")).unwrap();
    let outcome = registry.link_channels(&room("B"), &room("C")).unwrap();

    assert_eq!(outcome, LinkOutcome::Extended);
    assert_eq!(
        registry.get_linked_channels(&room("B")),
        vec![room("A"), room("C")]
    );
    assert_eq!(
        registry.get_linked_channels(&room("C")),
        vec![room("A"), room("B")]
    );
}

#[test]
fn test_unlink_pair_removes_group_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut registry = open(&path);
    registry.link_channels(&room("A"), &room("B")).unwrap();
    assert!(registry.unlink_channels(&room("A")).unwrap());
    assert!(registry.get_linked_channels(&room("B")).is_empty());
    drop(registry);

    assert!(open(&path).groups().is_empty());
}

#[test]
fn test_unlink_unknown_room() {
    let dir = tempdir().unwrap();
    let mut registry = open(&dir.path().join("store.json"));
    registry.link_channels(&room("A"), &room("B")).unwrap();

    assert!(!registry.unlink_channels(&room("Z")).unwrap());
    assert_eq!(registry.groups().len(), 1);
}

#[test]
fn test_malformed_store_is_fatal_and_preserved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{ not json").unwrap();

    let mut registry = LinkRegistry::open(&path);
    let err = registry.load().unwrap_err();

    assert!(matches!(err, RegistryError::Malformed(_)));
    assert!(!registry.is_loaded());
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn test_wrong_shape_is_malformed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, r#"{"links": {"channels": ["A", "B"]}}"#).unwrap();

    let err = LinkRegistry::open(&path).load().unwrap_err();
    assert!(matches!(err, RegistryError::Malformed(_)));
}

#[test]
fn test_no_store_access_before_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let mut registry = LinkRegistry::open(&path);

    assert!(registry.get_linked_channels(&room("A")).is_empty());
    assert_eq!(
        registry.link_channels(&room("A"), &room("B")).unwrap(),
        LinkOutcome::NotLoaded
    );
    assert!(!registry.unlink_channels(&room("A")).unwrap());
    assert!(!path.exists());
}

#[test]
fn test_legacy_overlapping_groups_are_merged_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(
        &path,
        r#"{"links": [{"channels": ["A", "B"]}, {"channels": ["B", "C"]}]}"#,
    )
    .unwrap();

    let registry = open(&path);
    assert_eq!(
        registry.get_linked_channels(&room("B")),
        vec![room("A"), room("C")]
    );

    let rewritten: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        rewritten,
        serde_json::json!({ "links": [ { "channels": ["A", "B", "C"] } ] })
    );
}

#[derive(Debug, Clone)]
enum Op {
    Link(u8, u8),
    Unlink(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8, 0u8..8).prop_map(|(a, b)| Op::Link(a, b)),
        (0u8..8).prop_map(Op::Unlink),
    ]
}

fn apply(registry: &mut LinkRegistry<JsonFileStore>, op: &Op) {
    match op {
        Op::Link(a, b) if a == b => {
            let err = registry
                .link_channels(&room(&a.to_string()), &room(&b.to_string()))
                .unwrap_err();
            assert!(matches!(err, RegistryError::SelfLink(_)));
        }
        Op::Link(a, b) => {
            registry
                .link_channels(&room(&a.to_string()), &room(&b.to_string()))
                .unwrap();
        }
        Op::Unlink(a) => {
            registry.unlink_channels(&room(&a.to_string())).unwrap();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_reload_yields_same_groups(ops in prop::collection::vec(op(), 0..24)) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut registry = open(&path);
        for op in &ops {
            apply(&mut registry, op);
        }
        let before = membership(&registry);
        drop(registry);

        prop_assert_eq!(membership(&open(&path)), before);
    }

    #[test]
    fn prop_groups_are_active_and_disjoint(ops in prop::collection::vec(op(), 0..24)) {
        let dir = tempdir().unwrap();
        let mut registry = open(&dir.path().join("store.json"));
        for op in &ops {
            apply(&mut registry, op);
        }

        let mut seen = HashSet::new();
        for group in registry.groups() {
            prop_assert!(group.len() >= 2);
            for channel in group.channels() {
                prop_assert!(seen.insert(channel.clone()), "{} in two groups", channel);
            }
        }
    }

    #[test]
    fn prop_links_are_symmetric(ops in prop::collection::vec(op(), 0..24)) {
        let dir = tempdir().unwrap();
        let mut registry = open(&dir.path().join("store.json"));
        for op in &ops {
            apply(&mut registry, op);
        }

        for a in 0u8..8 {
            let a = room(&a.to_string());
            for b in registry.get_linked_channels(&a) {
                prop_assert!(b != a);
                prop_assert!(registry.get_linked_channels(&b).contains(&a));
            }
        }
    }
}
