//! World management.
//!
//! A [`WorldManager`] is an explicitly constructed set of worlds. There is no
//! process-wide instance; whoever needs one creates it and passes it around.

use std::sync::Arc;

use dashmap::DashMap;
use log::info;
use parking_lot::RwLock;
use warden_core::id::normalize;
use warden_core::traits::{IdentityLookup, Storage};
use warden_core::utils::WardenConfig;

use crate::world::{CleanupReport, World};

/// A collection of worlds keyed by case-insensitive name.
#[derive(Default)]
pub struct WorldManager {
    /// Worlds, indexed by normalized name.
    worlds: DashMap<String, Arc<World>>,

    /// Normalized name of the world used when none is given.
    default_world: RwLock<Option<String>>,
}

impl WorldManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create every world listed in `config`, all sharing `storage`.
    ///
    /// Worlds with `online_mode` set resolve display names through
    /// `online_lookup` when one is given; the others resolve offline.
    pub fn from_config(
        config: &WardenConfig,
        storage: Arc<dyn Storage>,
        online_lookup: Option<Arc<dyn IdentityLookup>>,
    ) -> Self {
        let manager = Self::new();
        for world_config in &config.worlds {
            let mut world = World::from_config(world_config, storage.clone());
            if world_config.online_mode {
                if let Some(lookup) = &online_lookup {
                    world = world.with_lookup(lookup.clone());
                }
            }
            manager.add_world(world);
        }
        if let Some(name) = &config.default_world {
            manager.set_default_world(name);
        }
        manager
    }

    /// Register a world, replacing any world with the same name.
    pub fn add_world(&self, world: World) -> Arc<World> {
        let world = Arc::new(world);
        self.worlds.insert(normalize(world.name()), world.clone());
        world
    }

    /// Look up a world by name.
    pub fn world(&self, name: &str) -> Option<Arc<World>> {
        self.worlds.get(&normalize(name)).map(|w| w.clone())
    }

    /// Unregister a world. Its cached entities are dropped unsaved.
    pub fn remove_world(&self, name: &str) -> Option<Arc<World>> {
        self.worlds.remove(&normalize(name)).map(|(_, w)| w)
    }

    /// Every registered world.
    pub fn worlds(&self) -> Vec<Arc<World>> {
        self.worlds.iter().map(|w| w.value().clone()).collect()
    }

    /// Choose the world returned by [`default_world`](Self::default_world).
    pub fn set_default_world(&self, name: &str) {
        *self.default_world.write() = Some(normalize(name));
    }

    /// The default world, or the only world if exactly one is registered.
    pub fn default_world(&self) -> Option<Arc<World>> {
        if let Some(name) = self.default_world.read().as_deref() {
            return self.world(name);
        }
        if self.worlds.len() == 1 {
            return self.worlds.iter().next().map(|w| w.value().clone());
        }
        None
    }

    /// Load every world. Returns `true` if all loads succeeded.
    pub fn load_all(&self) -> bool {
        let results: Vec<bool> = self.worlds().iter().map(|w| w.load()).collect();
        results.into_iter().all(|ok| ok)
    }

    /// Save every world. Returns `true` if all saves succeeded.
    pub fn save_all(&self) -> bool {
        let results: Vec<bool> = self.worlds().iter().map(|w| w.save()).collect();
        results.into_iter().all(|ok| ok)
    }

    /// Run a cleanup pass on every world.
    pub fn cleanup_all(&self) -> Vec<(String, CleanupReport)> {
        let reports: Vec<_> = self
            .worlds()
            .iter()
            .map(|w| (w.name().to_string(), w.cleanup()))
            .collect();
        info!("Cleaned up {} worlds", reports.len());
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::StaticLookup;
    use crate::store::InMemoryStore;
    use warden_core::types::EntityKind;

    #[test]
    fn test_worlds_by_name() {
        let manager = WorldManager::new();
        let store = Arc::new(InMemoryStore::new());
        manager.add_world(World::new("Survival", store.clone()));
        manager.add_world(World::new("creative", store));

        assert!(manager.world("SURVIVAL").is_some());
        assert_eq!(manager.worlds().len(), 2);
        assert!(manager.default_world().is_none());

        manager.set_default_world("Creative");
        assert_eq!(manager.default_world().unwrap().name(), "creative");

        assert!(manager.remove_world("survival").is_some());
        assert!(manager.world("survival").is_none());
    }

    #[test]
    fn test_single_world_is_default() {
        let manager = WorldManager::new();
        manager.add_world(World::new("only", Arc::new(InMemoryStore::new())));
        assert_eq!(manager.default_world().unwrap().name(), "only");
    }

    #[test]
    fn test_from_config() {
        let config = WardenConfig::from_toml_str(
            r#"
            default_world = "hub"

            [[worlds]]
            name = "hub"
            default_group = "guest"
            online_mode = true

            [[worlds]]
            name = "arena"
            "#,
        )
        .unwrap();

        let lookup: Arc<dyn IdentityLookup> = Arc::new(StaticLookup::new());
        let manager =
            WorldManager::from_config(&config, Arc::new(InMemoryStore::new()), Some(lookup));

        let hub = manager.default_world().unwrap();
        assert_eq!(hub.default_group(), "guest");
        // The online lookup knows nobody.
        assert!(hub.get("alice", EntityKind::User).is_err());

        let arena = manager.world("arena").unwrap();
        assert_eq!(arena.default_group(), "default");
        assert!(arena.get("alice", EntityKind::User).is_ok());
    }

    #[test]
    fn test_bulk_operations() {
        let store = Arc::new(InMemoryStore::new());
        let manager = WorldManager::new();
        manager.add_world(World::new("a", store.clone()));
        manager.add_world(World::new("b", store.clone()));

        manager.world("a").unwrap().get_group("admin").add_permission("x");
        assert!(manager.save_all());
        assert_eq!(store.save_count(), 2);

        assert!(manager.load_all());
        assert!(manager
            .world("a")
            .unwrap()
            .contains("admin", EntityKind::Group)
            .unwrap());

        let reports = manager.cleanup_all();
        assert_eq!(reports.len(), 2);
    }
}
