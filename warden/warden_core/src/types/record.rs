//! Persisted forms of entities and worlds.
//!
//! These are what storage backends read and write. The registry never hands
//! its live entities to a backend; it converts to and from these records.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityKind;
use crate::id::normalize;

/// A stored user or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Kind of the entity
    pub kind: EntityKind,

    /// Identity key (stable key for users, group name for groups)
    pub name: String,

    /// Last known human-readable name of a user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Own permissions
    #[serde(default)]
    pub permissions: BTreeSet<String>,

    /// Own metadata
    #[serde(default)]
    pub meta: BTreeMap<String, String>,

    /// Keys of the groups the entity directly belongs to
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl EntityRecord {
    /// Create an empty record.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            display_name: None,
            permissions: BTreeSet::new(),
            meta: BTreeMap::new(),
            groups: BTreeSet::new(),
        }
    }

    /// Add a permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Add a group membership.
    pub fn with_group(mut self, group: &str) -> Self {
        self.groups.insert(normalize(group));
        self
    }

    /// The normalized identity key of this record.
    pub fn key(&self) -> String {
        normalize(&self.name)
    }
}

/// Everything stored for one world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// World name
    pub world: String,

    /// Default group at the time of the snapshot
    #[serde(default)]
    pub default_group: Option<String>,

    /// Stored users
    #[serde(default)]
    pub users: Vec<EntityRecord>,

    /// Stored groups
    #[serde(default)]
    pub groups: Vec<EntityRecord>,

    /// When the snapshot was taken
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl WorldSnapshot {
    /// Create an empty snapshot.
    pub fn new(world: impl Into<String>) -> Self {
        Self {
            world: world.into(),
            default_group: None,
            users: Vec::new(),
            groups: Vec::new(),
            saved_at: None,
        }
    }

    /// Records stored for `kind`.
    pub fn records(&self, kind: EntityKind) -> &[EntityRecord] {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Group => &self.groups,
        }
    }

    /// Find a record by normalized key.
    pub fn record(&self, key: &str, kind: EntityKind) -> Option<&EntityRecord> {
        let key = normalize(key);
        self.records(kind).iter().find(|r| r.key() == key)
    }

    /// Insert or replace a record in the list matching its kind.
    pub fn upsert(&mut self, record: EntityRecord) {
        let key = record.key();
        let list = match record.kind {
            EntityKind::User => &mut self.users,
            EntityKind::Group => &mut self.groups,
        };
        match list.iter_mut().find(|r| r.key() == key) {
            Some(existing) => *existing = record,
            None => list.push(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = EntityRecord::new(EntityKind::Group, "Admin")
            .with_permission("server.stop")
            .with_meta("prefix", "[A]")
            .with_group("\u{a7}cModerator");

        assert_eq!(record.key(), "admin");
        assert!(record.groups.contains("moderator"));
        assert_eq!(record.meta.get("prefix").map(String::as_str), Some("[A]"));
    }

    #[test]
    fn test_snapshot_upsert_and_lookup() {
        let mut snapshot = WorldSnapshot::new("world");
        snapshot.upsert(EntityRecord::new(EntityKind::Group, "admin"));
        snapshot.upsert(EntityRecord::new(EntityKind::Group, "ADMIN").with_permission("a"));

        assert_eq!(snapshot.groups.len(), 1);
        assert!(snapshot.record("Admin", EntityKind::Group).unwrap().permissions.contains("a"));
        assert!(snapshot.record("admin", EntityKind::User).is_none());
    }

    #[test]
    fn test_snapshot_defaults_when_deserializing() {
        let snapshot: WorldSnapshot = serde_json::from_str(r#"{"world":"w"}"#).unwrap();
        assert!(snapshot.users.is_empty());
        assert!(snapshot.groups.is_empty());
        assert!(snapshot.saved_at.is_none());
    }
}
