//! Storage collaborator.

use crate::types::{EntityKind, EntityRecord, WorldSnapshot};

/// Trait for permission storage.
///
/// A storage backend persists the users and groups of one or more worlds.
/// Failures are reported as `None`/`false` only; a backend logs the reason
/// itself and the registry treats the affected entity as not stored.
///
/// Backends return data instead of inserting into the world, so the world
/// decides when and under which lock anything is cached.
pub trait Storage: Send + Sync {
    /// Load everything stored for `world`.
    ///
    /// # Returns
    ///
    /// * `Some(WorldSnapshot)` - The stored users and groups.
    /// * `None` - If the world could not be loaded.
    fn load(&self, world: &str) -> Option<WorldSnapshot>;

    /// Persist a complete world, replacing what was stored before.
    ///
    /// # Returns
    ///
    /// `true` if the snapshot was written.
    fn save(&self, snapshot: &WorldSnapshot) -> bool;

    /// Load a single entity.
    ///
    /// # Arguments
    ///
    /// * `world` - The world name.
    /// * `key` - The normalized identity key.
    /// * `kind` - Whether a user or a group is wanted.
    ///
    /// # Returns
    ///
    /// * `Some(EntityRecord)` - The stored entity.
    /// * `None` - If it is not stored or could not be read.
    fn load_one(&self, world: &str, key: &str, kind: EntityKind) -> Option<EntityRecord>;

    /// Check whether the store holds an entity.
    fn store_contains(&self, world: &str, key: &str, kind: EntityKind) -> bool;
}
