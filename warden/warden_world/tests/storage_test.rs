//! Integration tests for the world's use of its storage collaborator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use warden_core::traits::Storage;
use warden_core::types::{EntityKind, EntityRecord, WorldSnapshot};
use warden_world::{JsonFileStore, World};

/// A store that claims to hold everything but cannot read or write anything.
#[derive(Default)]
struct BrokenStore {
    load_one_calls: AtomicUsize,
}

impl Storage for BrokenStore {
    fn load(&self, _world: &str) -> Option<WorldSnapshot> {
        None
    }

    fn save(&self, _snapshot: &WorldSnapshot) -> bool {
        false
    }

    fn load_one(&self, _world: &str, _key: &str, _kind: EntityKind) -> Option<EntityRecord> {
        self.load_one_calls.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn store_contains(&self, _world: &str, _key: &str, _kind: EntityKind) -> bool {
        true
    }
}

#[test]
fn test_failed_hydration_creates_fresh_entity() {
    let store = Arc::new(BrokenStore::default());
    let world = World::new("world", store.clone());

    let group = world.get_group("admin");
    assert!(group.permissions().is_empty());
    assert!(store.load_one_calls.load(Ordering::SeqCst) >= 1);

    let user = world.get_user("alice").unwrap();
    assert!(user.in_group("default"));

    // Once cached, storage is not consulted again.
    let calls = store.load_one_calls.load(Ordering::SeqCst);
    world.get_user("alice").unwrap();
    assert_eq!(store.load_one_calls.load(Ordering::SeqCst), calls);
}

#[test]
fn test_failed_load_keeps_caches() {
    let world = World::new("world", Arc::new(BrokenStore::default()));
    world.get_group("admin").add_permission("x");

    assert!(!world.load());
    assert!(world.contains("admin", EntityKind::Group).unwrap());
}

#[test]
fn test_failed_save_is_reported_by_cleanup() {
    let world = World::new("world", Arc::new(BrokenStore::default()));
    world.get_group("empty");

    let report = world.cleanup();
    assert_eq!(report.groups_removed, 1);
    assert!(!report.saved);
}

#[test]
fn test_world_persists_through_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));

    {
        let world = World::new("Survival", store.clone()).with_default_group("member");
        let member = world.get_group("member");
        member.add_permission("chat.talk");
        member.set_meta("prefix", "[M]");
        let user = world.get_user("Alice").unwrap();
        user.add_permission("home.set");
        assert!(world.save());
    }

    assert!(store.path_for("survival").exists());

    // Hydrate lazily without a bulk load.
    let world = World::new("survival", store).with_default_group("member");
    assert!(world.is_empty());
    let alice = world.get_user("alice").unwrap();
    assert!(alice.has_effective_permission("home.set"));
    assert!(alice.has_effective_permission("chat.talk"));
    assert_eq!(
        alice.effective_meta().get("prefix").map(String::as_str),
        Some("[M]")
    );
    assert_eq!(alice.display_name(), Some("alice".to_string()));
}
