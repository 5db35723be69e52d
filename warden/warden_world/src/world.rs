//! The per-world entity registry.
//!
//! A [`World`] owns two caches, one for users and one for groups, keyed by
//! normalized identity. Entities are handed out as shared handles; callers
//! that edit one must ask the world to [`recalculate`](World::recalculate) it.
//!
//! # Locking
//!
//! One `RwLock` guards both caches. Lookups of cached entities and snapshots
//! take it shared. `add`, `remove`, `clear`, inserting a hydrated or freshly
//! created entity, and the removal phase of `cleanup` take it exclusively.
//!
//! Storage and identity lookups run without the lock held; the insert that
//! follows uses the cache entry, so concurrent `get`s of the same key still
//! end up with one instance. Resolution also runs unlocked, against group
//! snapshots taken one at a time, and the result is published with a single
//! swap of the entity's effective view. Groups loaded from storage because a
//! resolution reached them are resolved in turn once it finishes, so every
//! cached entity has been resolved at least once. The save at the end of
//! `cleanup` runs after the lock is released.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;
use warden_core::error::{EntityError, RecursiveGroupError, Result};
use warden_core::id::{normalize, resolve_user_key, strip_color};
use warden_core::log_event;
use warden_core::traits::{HostHooks, IdentityLookup, Storage};
use warden_core::types::{
    Calculable, Entity, EntityKind, EntityRecord, Group, OwnData, User, WorldSnapshot,
};
use warden_core::utils::{LogLevel, WorldConfig};
use warden_resolver::{GroupSource, Resolver};

use crate::host::NoopHost;
use crate::lookup::OfflineLookup;

#[derive(Default)]
struct Caches {
    users: HashMap<String, Arc<User>>,
    groups: HashMap<String, Arc<Group>>,
}

/// What a cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Users removed
    pub users_removed: usize,

    /// Groups removed
    pub groups_removed: usize,

    /// Whether the following save succeeded
    pub saved: bool,
}

/// A permission namespace.
///
/// Two worlds are equal, and hash the same, when their names match ignoring
/// case, whatever they have cached.
pub struct World {
    name: String,
    default_group: RwLock<String>,
    auto_cleanup: bool,
    caches: RwLock<Caches>,
    storage: Arc<dyn Storage>,
    lookup: Arc<dyn IdentityLookup>,
    host: Arc<dyn HostHooks>,
}

impl World {
    /// Create an empty world backed by `storage`.
    ///
    /// The default group is `default`, display names are resolved offline,
    /// and the host supports nothing.
    pub fn new(name: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        Self {
            name: name.into(),
            default_group: RwLock::new("default".to_string()),
            auto_cleanup: false,
            caches: RwLock::new(Caches::default()),
            storage,
            lookup: Arc::new(OfflineLookup),
            host: Arc::new(NoopHost),
        }
    }

    /// Create a world from its configuration.
    pub fn from_config(config: &WorldConfig, storage: Arc<dyn Storage>) -> Self {
        let mut world = Self::new(config.name.clone(), storage)
            .with_default_group(config.default_group.clone());
        world.auto_cleanup = config.auto_cleanup;
        world
    }

    /// Set the default group.
    pub fn with_default_group(self, group: impl Into<String>) -> Self {
        *self.default_group.write() = group.into();
        self
    }

    /// Set the identity lookup used for user display names.
    pub fn with_lookup(mut self, lookup: Arc<dyn IdentityLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    /// Set the host hooks.
    pub fn with_host(mut self, host: Arc<dyn HostHooks>) -> Self {
        self.host = host;
        self
    }

    /// Run a cleanup pass after every successful `load`.
    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    /// The world name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether `name` names this world, ignoring case.
    pub fn equals_name(&self, name: &str) -> bool {
        normalize(name) == normalize(&self.name)
    }

    /// The group attached to new users.
    pub fn default_group(&self) -> String {
        self.default_group.read().clone()
    }

    /// Change the group attached to new users. Existing users keep theirs.
    pub fn set_default_group(&self, group: impl Into<String>) {
        *self.default_group.write() = group.into();
    }

    /// The storage backend.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    /// Translate `name` into the cache key for `kind`.
    ///
    /// Users go through the identity lookup, whose failure is returned.
    pub fn key_for(&self, name: &str, kind: EntityKind) -> Result<String> {
        match kind {
            EntityKind::User => Ok(resolve_user_key(name, self.lookup.as_ref())?),
            EntityKind::Group => Ok(normalize(name)),
        }
    }

    /// Check whether an entity is cached, without touching storage.
    pub fn contains(&self, name: &str, kind: EntityKind) -> Result<bool> {
        let key = self.key_for(name, kind)?;
        Ok(self.contains_key(&key, kind))
    }

    fn contains_key(&self, key: &str, kind: EntityKind) -> bool {
        let caches = self.caches.read();
        match kind {
            EntityKind::User => caches.users.contains_key(key),
            EntityKind::Group => caches.groups.contains_key(key),
        }
    }

    fn cached(&self, key: &str, kind: EntityKind) -> Option<Entity> {
        let caches = self.caches.read();
        match kind {
            EntityKind::User => caches.users.get(key).cloned().map(Entity::User),
            EntityKind::Group => caches.groups.get(key).cloned().map(Entity::Group),
        }
    }

    /// Get an entity, hydrating or creating it if needed.
    ///
    /// A cached entity is returned as is. Otherwise the entity is loaded from
    /// storage if it is stored there, and resolved. If storage has nothing, an
    /// empty entity is created; a new user joins the default group and is
    /// resolved immediately. A cycle found during that resolution is logged
    /// and the user is still returned.
    ///
    /// Repeated calls with the same normalized key return the same instance
    /// until it is removed.
    ///
    /// # Errors
    ///
    /// Only user lookups by display name can fail, when the identity lookup
    /// cannot translate the name.
    pub fn get(&self, name: &str, kind: EntityKind) -> Result<Entity> {
        match kind {
            EntityKind::User => Ok(Entity::User(self.get_user(name)?)),
            EntityKind::Group => Ok(Entity::Group(self.get_group(name))),
        }
    }

    /// Get a group by name.
    pub fn get_group(&self, name: &str) -> Arc<Group> {
        let key = normalize(name);
        if let Some(group) = self.caches.read().groups.get(&key) {
            return group.clone();
        }

        if let Some(Entity::Group(group)) = self.hydrate(&key, EntityKind::Group) {
            self.recalculate_logged(&group);
            return group;
        }

        let (group, created) = {
            let mut caches = self.caches.write();
            match caches.groups.entry(key) {
                Entry::Occupied(entry) => (entry.get().clone(), false),
                Entry::Vacant(entry) => {
                    let group = Arc::new(Group::new(entry.key(), &self.name));
                    entry.insert(group.clone());
                    (group, true)
                }
            }
        };

        if created {
            log_event!(LogLevel::Debug, "Created group",
                world => self.name,
                group => group.key(),
            );
        }

        group
    }

    /// Get a user by display name or stable key.
    pub fn get_user(&self, name: &str) -> Result<Arc<User>> {
        let key = self.key_for(name, EntityKind::User)?;
        let display_name = if self.lookup.is_stable_key_shaped(&normalize(name)) {
            None
        } else {
            Some(strip_color(name))
        };
        Ok(self.user_by_key(key, display_name))
    }

    /// Get a user by stable key.
    pub fn get_user_by_uuid(&self, uuid: Uuid) -> Arc<User> {
        self.user_by_key(uuid.hyphenated().to_string(), None)
    }

    fn user_by_key(&self, key: String, display_name: Option<String>) -> Arc<User> {
        if let Some(user) = self.caches.read().users.get(&key) {
            return user.clone();
        }

        if let Some(Entity::User(user)) = self.hydrate(&key, EntityKind::User) {
            if let Some(name) = display_name {
                user.set_display_name(name);
            }
            self.recalculate_logged(&user);
            return user;
        }

        // Materialize the default group first so it is cached alongside the
        // user and hydrated from storage if it is stored there.
        let default_group = self.get_group(&self.default_group());

        let (user, created) = {
            let mut caches = self.caches.write();
            match caches.users.entry(key) {
                Entry::Occupied(entry) => (entry.get().clone(), false),
                Entry::Vacant(entry) => {
                    let user = Arc::new(User::new(entry.key(), &self.name));
                    user.add_group(default_group.key());
                    if let Some(name) = display_name {
                        user.set_display_name(name);
                    }
                    entry.insert(user.clone());
                    (user, true)
                }
            }
        };

        if created {
            log_event!(LogLevel::Debug, "Created user",
                world => self.name,
                user => user.key(),
                default_group => default_group.key(),
            );
            self.recalculate_logged(&user);
        }

        user
    }

    /// Load a single entity from storage into the cache.
    ///
    /// Returns `None` if storage does not hold it or fails to read it; the
    /// caller then treats the entity as unstored. If another caller cached
    /// the same key meanwhile, that instance wins.
    fn hydrate(&self, key: &str, kind: EntityKind) -> Option<Entity> {
        if !self.storage.store_contains(&self.name, key, kind) {
            return None;
        }

        let Some(record) = self.storage.load_one(&self.name, key, kind) else {
            log_event!(LogLevel::Warning, "Failed to load stored entity",
                world => self.name,
                kind => kind,
                key => key,
            );
            return None;
        };

        if record.kind != kind {
            log_event!(LogLevel::Warning,
                EntityError::Misclassified(record.kind.to_string()).to_string(),
                world => self.name,
                key => key,
            );
            return None;
        }

        let loaded = Entity::from_record(&record, &self.name);
        let mut caches = self.caches.write();
        let entity = match loaded {
            Entity::User(user) => {
                Entity::User(caches.users.entry(key.to_string()).or_insert(user).clone())
            }
            Entity::Group(group) => {
                Entity::Group(caches.groups.entry(key.to_string()).or_insert(group).clone())
            }
        };

        log::debug!("Hydrated {} '{}' in world '{}'", kind, key, self.name);
        Some(entity)
    }

    /// Every cached entity of `kind`, as a snapshot of handles.
    pub fn get_all(&self, kind: EntityKind) -> Vec<Entity> {
        let caches = self.caches.read();
        match kind {
            EntityKind::User => caches.users.values().cloned().map(Entity::User).collect(),
            EntityKind::Group => caches.groups.values().cloned().map(Entity::Group).collect(),
        }
    }

    /// Number of cached entities of `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        let caches = self.caches.read();
        match kind {
            EntityKind::User => caches.users.len(),
            EntityKind::Group => caches.groups.len(),
        }
    }

    /// Check whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        let caches = self.caches.read();
        caches.users.is_empty() && caches.groups.is_empty()
    }

    // ---------------------------------------------------------------------
    // Structural mutation
    // ---------------------------------------------------------------------

    /// Cache `entity` under its own key, replacing any entry with that key.
    ///
    /// An entity belonging to another world is rejected and logged.
    pub fn add(&self, entity: Entity) -> bool {
        if !self.equals_name(entity.world()) {
            log_event!(LogLevel::Warning, "Rejected entity from another world",
                world => self.name,
                entity_world => entity.world(),
                key => entity.key(),
            );
            return false;
        }

        let mut caches = self.caches.write();
        match entity {
            Entity::User(user) => {
                caches.users.insert(user.key().to_string(), user);
            }
            Entity::Group(group) => {
                caches.groups.insert(group.key().to_string(), group);
            }
        }
        true
    }

    /// Drop `entity` from the cache. Returns `false` if it was not cached.
    pub fn remove(&self, entity: &Entity) -> bool {
        let mut caches = self.caches.write();
        match entity {
            Entity::User(user) => caches.users.remove(user.key()).is_some(),
            Entity::Group(group) => caches.groups.remove(group.key()).is_some(),
        }
    }

    /// Drop every cached user and group.
    pub fn clear(&self) {
        let mut caches = self.caches.write();
        caches.users.clear();
        caches.groups.clear();
    }

    /// Drop every cached user, keeping groups.
    pub fn clear_players(&self) {
        self.caches.write().users.clear();
    }

    /// Remove entities that carry nothing, then save.
    ///
    /// A user is removed when it has no own permissions, no own metadata,
    /// and either no groups or only the default group. A group is removed
    /// when it has no own permissions, no own metadata, and no groups. Whether
    /// anyone still belongs to a removed group is not considered.
    pub fn cleanup(&self) -> CleanupReport {
        let default_group = normalize(&self.default_group());

        let (users_removed, groups_removed) = {
            let mut caches = self.caches.write();

            let users_before = caches.users.len();
            caches
                .users
                .retain(|_, user| !user.holds_no_data(Some(&default_group)));

            let groups_before = caches.groups.len();
            caches.groups.retain(|_, group| !group.holds_no_data(None));

            (
                users_before - caches.users.len(),
                groups_before - caches.groups.len(),
            )
        };

        let saved = self.save();

        log_event!(LogLevel::Info, "Cleaned up world",
            world => self.name,
            users_removed => users_removed,
            groups_removed => groups_removed,
            saved => saved,
        );

        CleanupReport {
            users_removed,
            groups_removed,
            saved,
        }
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Replace the caches with everything stored for this world and resolve
    /// every entity.
    ///
    /// Records filed under the wrong kind are skipped and logged. Returns
    /// `false`, leaving the caches untouched, if storage fails.
    pub fn load(&self) -> bool {
        let Some(snapshot) = self.storage.load(&self.name) else {
            log_event!(LogLevel::Error, "Failed to load world", world => self.name);
            return false;
        };

        let mut caches = Caches::default();
        for (expected, records) in [
            (EntityKind::User, &snapshot.users),
            (EntityKind::Group, &snapshot.groups),
        ] {
            for record in records {
                if record.kind != expected {
                    log_event!(LogLevel::Warning,
                        EntityError::Misclassified(record.kind.to_string()).to_string(),
                        world => self.name,
                        key => record.name,
                        filed_as => expected,
                    );
                    continue;
                }
                match Entity::from_record(record, &self.name) {
                    Entity::User(user) => {
                        caches.users.insert(user.key().to_string(), user);
                    }
                    Entity::Group(group) => {
                        caches.groups.insert(group.key().to_string(), group);
                    }
                }
            }
        }

        *self.caches.write() = caches;

        for err in self.recalculate_all() {
            log_event!(LogLevel::Warning, "Recursive group after load",
                world => self.name,
                cycle => err,
            );
        }

        log_event!(LogLevel::Info, "Loaded world",
            world => self.name,
            users => self.len(EntityKind::User),
            groups => self.len(EntityKind::Group),
        );

        if self.auto_cleanup {
            self.cleanup();
        }

        true
    }

    /// Persist every cached entity.
    pub fn save(&self) -> bool {
        let snapshot = self.snapshot();
        let saved = self.storage.save(&snapshot);
        if !saved {
            log_event!(LogLevel::Error, "Failed to save world", world => self.name);
        }
        saved
    }

    /// The stored form of every cached entity, sorted by key.
    pub fn snapshot(&self) -> WorldSnapshot {
        let (mut users, mut groups): (Vec<EntityRecord>, Vec<EntityRecord>) = {
            let caches = self.caches.read();
            (
                caches
                    .users
                    .values()
                    .map(|u| Entity::User(u.clone()).to_record())
                    .collect(),
                caches
                    .groups
                    .values()
                    .map(|g| Entity::Group(g.clone()).to_record())
                    .collect(),
            )
        };
        users.sort_by(|a, b| a.name.cmp(&b.name));
        groups.sort_by(|a, b| a.name.cmp(&b.name));

        WorldSnapshot {
            world: self.name.clone(),
            default_group: Some(self.default_group()),
            users,
            groups,
            saved_at: Some(chrono::Utc::now()),
        }
    }

    // ---------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------

    /// Recompute the effective view of `entity`.
    ///
    /// Accepts any handle that derefs to the shared entity base, so users,
    /// groups and [`Entity`] values all work. On a cycle the entity keeps its
    /// previous view and the cycle is returned.
    pub fn recalculate(
        &self,
        entity: &Calculable,
    ) -> std::result::Result<(), RecursiveGroupError> {
        let source = HydratingSource::new(self);
        let result = Resolver::new(&source).recalculate(entity);

        for group in source.hydrated.into_inner() {
            self.recalculate_logged(&group);
        }

        result
    }

    /// Recompute every cached group and user, collecting the cycles found.
    pub fn recalculate_all(&self) -> Vec<RecursiveGroupError> {
        let mut entities = self.get_all(EntityKind::Group);
        entities.extend(self.get_all(EntityKind::User));

        entities
            .iter()
            .filter_map(|entity| self.recalculate(entity).err())
            .collect()
    }

    fn recalculate_logged(&self, entity: &Calculable) {
        if let Err(err) = self.recalculate(entity) {
            log_event!(LogLevel::Warning, "Recursive group",
                world => self.name,
                kind => entity.kind(),
                key => entity.key(),
                cycle => err,
            );
        }
    }

    // ---------------------------------------------------------------------
    // Host hooks
    // ---------------------------------------------------------------------

    /// Ask the host to apply a player's permissions.
    pub fn setup_player(&self, player: &str) -> bool {
        self.host.setup_player(&self.name, player)
    }

    /// Ask the host to apply every online player's permissions.
    pub fn setup_all(&self) -> bool {
        self.host.setup_all(&self.name)
    }

    /// Ask the host whether `user` is online.
    pub fn is_online(&self, user: &User) -> bool {
        self.host.is_online(&self.name, user)
    }
}

/// The groups of a world as seen by one resolution.
///
/// Cached groups are read directly; uncached ones are hydrated from storage
/// and remembered so the world can resolve them afterwards. A group that is
/// nowhere contributes nothing.
struct HydratingSource<'w> {
    world: &'w World,
    hydrated: Mutex<Vec<Arc<Group>>>,
}

impl<'w> HydratingSource<'w> {
    fn new(world: &'w World) -> Self {
        Self {
            world,
            hydrated: Mutex::new(Vec::new()),
        }
    }
}

impl GroupSource for HydratingSource<'_> {
    fn group(&self, key: &str) -> Option<OwnData> {
        if let Some(group) = self.world.caches.read().groups.get(key) {
            return Some(group.own());
        }

        match self.world.hydrate(key, EntityKind::Group) {
            Some(Entity::Group(group)) => {
                let own = group.own();
                self.hydrated.lock().push(group);
                Some(own)
            }
            _ => None,
        }
    }
}

impl PartialEq for World {
    fn eq(&self, other: &Self) -> bool {
        normalize(&self.name) == normalize(&other.name)
    }
}

impl Eq for World {}

impl Hash for World {
    fn hash<H: Hasher>(&self, state: &mut H) {
        normalize(&self.name).hash(state);
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("name", &self.name)
            .field("default_group", &self.default_group())
            .field("users", &self.len(EntityKind::User))
            .field("groups", &self.len(EntityKind::Group))
            .finish()
    }
}
