//! The entity model.
//!
//! A [`Calculable`] holds the data shared by users and groups: its own
//! permissions, metadata, and group memberships, plus the cached effective
//! view produced by the resolver. [`User`] and [`Group`] wrap it, and
//! [`Entity`] is the closed sum over both that the registry hands out.
//!
//! Entities are shared by `Arc`. Edits through any handle are visible to every
//! other holder; nothing is copied defensively. Editing own data does not
//! refresh the effective view. The owning world must be asked to recalculate.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{EntityKind, EntityRecord};
use crate::id::normalize;

/// The data an entity holds directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnData {
    /// Own permissions
    pub permissions: BTreeSet<String>,

    /// Own metadata
    pub meta: BTreeMap<String, String>,

    /// Keys of the groups the entity directly belongs to
    pub groups: BTreeSet<String>,
}

/// Flattened permissions and metadata after inheritance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveView {
    /// Every permission granted anywhere in the ancestry, verbatim
    pub permissions: BTreeSet<String>,

    /// Metadata with the closest definition of each key
    pub meta: BTreeMap<String, String>,
}

impl EffectiveView {
    /// Check whether `permission` is present verbatim.
    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// State shared by users and groups.
#[derive(Debug)]
pub struct Calculable {
    kind: EntityKind,
    key: String,
    /// Name of the owning world; resolved through the world, never owned.
    world: String,
    own: RwLock<OwnData>,
    effective: RwLock<Arc<EffectiveView>>,
}

impl Calculable {
    fn new(kind: EntityKind, key: &str, world: &str, own: OwnData) -> Self {
        Self {
            kind,
            key: normalize(key),
            world: world.to_string(),
            own: RwLock::new(own),
            effective: RwLock::new(Arc::new(EffectiveView::default())),
        }
    }

    /// Kind of this entity.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Normalized identity key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name of the world this entity belongs to.
    pub fn world(&self) -> &str {
        &self.world
    }

    /// Snapshot of the entity's own data.
    pub fn own(&self) -> OwnData {
        self.own.read().clone()
    }

    /// Own permissions.
    pub fn permissions(&self) -> BTreeSet<String> {
        self.own.read().permissions.clone()
    }

    /// Own metadata.
    pub fn meta(&self) -> BTreeMap<String, String> {
        self.own.read().meta.clone()
    }

    /// Keys of the groups this entity directly belongs to.
    pub fn groups(&self) -> BTreeSet<String> {
        self.own.read().groups.clone()
    }

    /// Check direct membership in `group`.
    pub fn in_group(&self, group: &str) -> bool {
        self.own.read().groups.contains(&normalize(group))
    }

    /// Grant a permission. Returns `false` if it was already held.
    pub fn add_permission(&self, permission: impl Into<String>) -> bool {
        self.own.write().permissions.insert(permission.into())
    }

    /// Revoke a permission. Returns `false` if it was not held.
    pub fn remove_permission(&self, permission: &str) -> bool {
        self.own.write().permissions.remove(permission)
    }

    /// Set a metadata value, returning the previous one.
    pub fn set_meta(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.own.write().meta.insert(key.into(), value.into())
    }

    /// Remove a metadata value.
    pub fn remove_meta(&self, key: &str) -> Option<String> {
        self.own.write().meta.remove(key)
    }

    /// Join a group. Returns `false` if already a member.
    pub fn add_group(&self, group: &str) -> bool {
        self.own.write().groups.insert(normalize(group))
    }

    /// Leave a group. Returns `false` if not a member.
    pub fn remove_group(&self, group: &str) -> bool {
        self.own.write().groups.remove(&normalize(group))
    }

    /// Drop all own data. The effective view is kept until recalculated.
    pub fn clear(&self) {
        *self.own.write() = OwnData::default();
    }

    /// Check whether the entity carries nothing worth keeping.
    ///
    /// No own permissions, no own metadata, and either no memberships or
    /// exactly the single membership `allowed_group`.
    pub fn holds_no_data(&self, allowed_group: Option<&str>) -> bool {
        let own = self.own.read();
        if !own.permissions.is_empty() || !own.meta.is_empty() {
            return false;
        }
        match own.groups.len() {
            0 => true,
            1 => match allowed_group {
                Some(group) => own.groups.contains(&normalize(group)),
                None => false,
            },
            _ => false,
        }
    }

    /// The current effective view.
    pub fn effective(&self) -> Arc<EffectiveView> {
        self.effective.read().clone()
    }

    /// Effective permissions.
    pub fn effective_permissions(&self) -> BTreeSet<String> {
        self.effective().permissions.clone()
    }

    /// Effective metadata.
    pub fn effective_meta(&self) -> BTreeMap<String, String> {
        self.effective().meta.clone()
    }

    /// Check whether `permission` is present verbatim in the effective view.
    pub fn has_effective_permission(&self, permission: &str) -> bool {
        self.effective.read().contains(permission)
    }

    /// Replace the effective view in one step. Readers see either the old
    /// view or the new one.
    pub fn replace_effective(&self, view: EffectiveView) {
        *self.effective.write() = Arc::new(view);
    }

    fn record(&self) -> EntityRecord {
        let own = self.own.read();
        EntityRecord {
            kind: self.kind,
            name: self.key.clone(),
            display_name: None,
            permissions: own.permissions.clone(),
            meta: own.meta.clone(),
            groups: own.groups.clone(),
        }
    }
}

fn own_from_record(record: &EntityRecord) -> OwnData {
    OwnData {
        permissions: record.permissions.clone(),
        meta: record.meta.clone(),
        groups: record.groups.iter().map(|g| normalize(g)).collect(),
    }
}

/// A user.
#[derive(Debug)]
pub struct User {
    base: Calculable,
    display_name: RwLock<Option<String>>,
}

impl User {
    /// Create an empty user with the given stable key.
    pub fn new(key: &str, world: &str) -> Self {
        Self {
            base: Calculable::new(EntityKind::User, key, world, OwnData::default()),
            display_name: RwLock::new(None),
        }
    }

    /// Last known human-readable name.
    pub fn display_name(&self) -> Option<String> {
        self.display_name.read().clone()
    }

    /// Remember the human-readable name this user was looked up by.
    pub fn set_display_name(&self, name: impl Into<String>) {
        *self.display_name.write() = Some(name.into());
    }
}

impl Deref for User {
    type Target = Calculable;

    fn deref(&self) -> &Calculable {
        &self.base
    }
}

/// A group.
#[derive(Debug)]
pub struct Group {
    base: Calculable,
}

impl Group {
    /// Create an empty group with the given name.
    pub fn new(name: &str, world: &str) -> Self {
        Self {
            base: Calculable::new(EntityKind::Group, name, world, OwnData::default()),
        }
    }
}

impl Deref for Group {
    type Target = Calculable;

    fn deref(&self) -> &Calculable {
        &self.base
    }
}

/// A user or a group, shared by reference.
#[derive(Debug, Clone)]
pub enum Entity {
    /// A user
    User(Arc<User>),

    /// A group
    Group(Arc<Group>),
}

impl Entity {
    /// Create an empty entity of the given kind.
    pub fn new(kind: EntityKind, key: &str, world: &str) -> Self {
        match kind {
            EntityKind::User => Self::User(Arc::new(User::new(key, world))),
            EntityKind::Group => Self::Group(Arc::new(Group::new(key, world))),
        }
    }

    /// Build an entity from its stored form.
    pub fn from_record(record: &EntityRecord, world: &str) -> Self {
        let own = own_from_record(record);
        match record.kind {
            EntityKind::User => Self::User(Arc::new(User {
                base: Calculable::new(EntityKind::User, &record.name, world, own),
                display_name: RwLock::new(record.display_name.clone()),
            })),
            EntityKind::Group => Self::Group(Arc::new(Group {
                base: Calculable::new(EntityKind::Group, &record.name, world, own),
            })),
        }
    }

    /// The stored form of this entity.
    pub fn to_record(&self) -> EntityRecord {
        match self {
            Self::User(user) => {
                let mut record = user.record();
                record.display_name = user.display_name();
                record
            }
            Self::Group(group) => group.record(),
        }
    }

    /// The shared entity state.
    pub fn calculable(&self) -> &Calculable {
        match self {
            Self::User(user) => &user.base,
            Self::Group(group) => &group.base,
        }
    }

    /// The user, if this is one.
    pub fn as_user(&self) -> Option<&Arc<User>> {
        match self {
            Self::User(user) => Some(user),
            Self::Group(_) => None,
        }
    }

    /// The group, if this is one.
    pub fn as_group(&self) -> Option<&Arc<Group>> {
        match self {
            Self::Group(group) => Some(group),
            Self::User(_) => None,
        }
    }

    /// Check whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        match (self, other) {
            (Self::User(a), Self::User(b)) => Arc::ptr_eq(a, b),
            (Self::Group(a), Self::Group(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Deref for Entity {
    type Target = Calculable;

    fn deref(&self) -> &Calculable {
        self.calculable()
    }
}

impl From<Arc<User>> for Entity {
    fn from(user: Arc<User>) -> Self {
        Self::User(user)
    }
}

impl From<Arc<Group>> for Entity {
    fn from(group: Arc<Group>) -> Self {
        Self::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_edits() {
        let group = Group::new("\u{a7}aBuilders", "world");
        assert_eq!(group.key(), "builders");
        assert_eq!(group.kind(), EntityKind::Group);
        assert_eq!(group.world(), "world");

        assert!(group.add_permission("build.place"));
        assert!(!group.add_permission("build.place"));
        assert_eq!(group.set_meta("prefix", "[B]"), None);
        assert_eq!(group.set_meta("prefix", "[Builder]"), Some("[B]".to_string()));
        assert!(group.add_group("Default"));
        assert!(group.in_group("DEFAULT"));

        assert!(group.remove_permission("build.place"));
        assert_eq!(group.remove_meta("prefix"), Some("[Builder]".to_string()));
        assert!(group.remove_group("default"));
        assert!(group.holds_no_data(None));
    }

    #[test]
    fn test_holds_no_data() {
        let user = User::new("6f1c2a8e-0d4b-4c55-9a43-2f0f5f1e9b10", "world");
        assert!(user.holds_no_data(Some("default")));

        user.add_group("default");
        assert!(user.holds_no_data(Some("default")));
        assert!(!user.holds_no_data(None));

        user.add_group("vip");
        assert!(!user.holds_no_data(Some("default")));

        user.clear();
        user.set_meta("suffix", "!");
        assert!(!user.holds_no_data(Some("default")));
    }

    #[test]
    fn test_effective_view_is_replaced_whole() {
        let group = Group::new("admin", "world");
        let before = group.effective();
        assert!(before.permissions.is_empty());

        let mut view = EffectiveView::default();
        view.permissions.insert("a".into());
        group.replace_effective(view);

        // The old handle is untouched.
        assert!(before.permissions.is_empty());
        assert!(group.has_effective_permission("a"));
    }

    #[test]
    fn test_edits_visible_through_clones() {
        let entity = Entity::new(EntityKind::Group, "admin", "world");
        let other = entity.clone();
        entity.add_permission("server.stop");

        assert!(other.permissions().contains("server.stop"));
        assert!(entity.ptr_eq(&other));
        assert!(!entity.ptr_eq(&Entity::new(EntityKind::Group, "admin", "world")));
    }

    #[test]
    fn test_record_conversion() {
        let mut record =
            EntityRecord::new(EntityKind::User, "6F1C2A8E-0D4B-4C55-9A43-2F0F5F1E9B10")
                .with_permission("chat.color")
                .with_group("VIP");
        record.display_name = Some("Alice".into());

        let entity = Entity::from_record(&record, "world");
        assert_eq!(entity.key(), "6f1c2a8e-0d4b-4c55-9a43-2f0f5f1e9b10");
        assert!(entity.in_group("vip"));
        assert_eq!(
            entity.as_user().unwrap().display_name(),
            Some("Alice".to_string())
        );

        let back = entity.to_record();
        assert_eq!(back.name, "6f1c2a8e-0d4b-4c55-9a43-2f0f5f1e9b10");
        assert_eq!(back.permissions, record.permissions);
        assert_eq!(back.display_name, Some("Alice".to_string()));
    }
}
