//! In-memory storage.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use warden_core::traits::Storage;
use warden_core::types::{EntityKind, EntityRecord, WorldSnapshot};

/// An in-memory store holding one snapshot per world.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    /// Snapshots, indexed by lowercased world name.
    worlds: Arc<DashMap<String, WorldSnapshot>>,

    /// Number of successful saves.
    saves: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record directly, as if it had been saved earlier.
    pub fn insert(&self, world: &str, record: EntityRecord) {
        self.worlds
            .entry(world.to_lowercase())
            .or_insert_with(|| WorldSnapshot::new(world))
            .upsert(record);
    }

    /// The stored snapshot of `world`, if any.
    pub fn snapshot(&self, world: &str) -> Option<WorldSnapshot> {
        self.worlds.get(&world.to_lowercase()).map(|s| s.clone())
    }

    /// How many times a world has been saved.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Storage for InMemoryStore {
    fn load(&self, world: &str) -> Option<WorldSnapshot> {
        Some(
            self.snapshot(world)
                .unwrap_or_else(|| WorldSnapshot::new(world)),
        )
    }

    fn save(&self, snapshot: &WorldSnapshot) -> bool {
        let mut stored = snapshot.clone();
        stored.saved_at = Some(Utc::now());
        self.worlds.insert(snapshot.world.to_lowercase(), stored);
        self.saves.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn load_one(&self, world: &str, key: &str, kind: EntityKind) -> Option<EntityRecord> {
        self.worlds
            .get(&world.to_lowercase())
            .and_then(|s| s.record(key, kind).cloned())
    }

    fn store_contains(&self, world: &str, key: &str, kind: EntityKind) -> bool {
        self.worlds
            .get(&world.to_lowercase())
            .map(|s| s.record(key, kind).is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_load_one() {
        let store = InMemoryStore::new();
        store.insert(
            "World",
            EntityRecord::new(EntityKind::Group, "Admin").with_permission("server.stop"),
        );

        assert!(store.store_contains("world", "admin", EntityKind::Group));
        assert!(!store.store_contains("world", "admin", EntityKind::User));
        assert!(!store.store_contains("nether", "admin", EntityKind::Group));

        let record = store.load_one("WORLD", "ADMIN", EntityKind::Group).unwrap();
        assert!(record.permissions.contains("server.stop"));
    }

    #[test]
    fn test_load_unknown_world_is_empty() {
        let store = InMemoryStore::new();
        let snapshot = store.load("fresh").unwrap();
        assert_eq!(snapshot.world, "fresh");
        assert!(snapshot.users.is_empty());
    }

    #[test]
    fn test_save_replaces_world() {
        let store = InMemoryStore::new();
        store.insert("world", EntityRecord::new(EntityKind::Group, "old"));

        let mut snapshot = WorldSnapshot::new("world");
        snapshot.upsert(EntityRecord::new(EntityKind::Group, "new"));
        assert!(store.save(&snapshot));

        assert!(!store.store_contains("world", "old", EntityKind::Group));
        assert!(store.store_contains("world", "new", EntityKind::Group));
        assert_eq!(store.save_count(), 1);
        assert!(store.snapshot("world").unwrap().saved_at.is_some());
    }
}
