//! JSON file storage.
//!
//! Each world is one pretty-printed JSON document, `<root>/<world>.json`.
//! Writes go to a sibling temporary file that is renamed over the target, so
//! a crash mid-save leaves the previous document intact.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, error, warn};
use warden_core::error::StorageError;
use warden_core::id::normalize;
use warden_core::traits::Storage;
use warden_core::types::{EntityKind, EntityRecord, WorldSnapshot};

/// A store keeping one JSON file per world.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding the world files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a world is stored in.
    ///
    /// Characters other than ASCII alphanumerics, `-` and `_` are replaced so
    /// a world name can never escape the root directory.
    pub fn path_for(&self, world: &str) -> PathBuf {
        let file: String = normalize(world)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", file))
    }

    /// Read a world from disk. A missing file is an empty world.
    pub fn read(&self, world: &str) -> Result<WorldSnapshot, StorageError> {
        let path = self.path_for(world);
        if !path.exists() {
            debug!("No file for world '{}' at {}", world, path.display());
            return Ok(WorldSnapshot::new(world));
        }

        let bytes = fs::read(&path)?;
        let snapshot: WorldSnapshot = serde_json::from_slice(&bytes)?;
        if normalize(&snapshot.world) != normalize(world) {
            return Err(StorageError::Corrupt(format!(
                "{} holds world '{}', expected '{}'",
                path.display(),
                snapshot.world,
                world
            )));
        }

        Ok(snapshot)
    }

    /// Write a world to disk, replacing its previous file.
    pub fn write(&self, snapshot: &WorldSnapshot) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let path = self.path_for(&snapshot.world);
        let tmp = path.with_extension("json.tmp");

        let mut stored = snapshot.clone();
        stored.saved_at = Some(Utc::now());
        let bytes = serde_json::to_vec_pretty(&stored)?;

        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;

        debug!("Saved world '{}' to {}", snapshot.world, path.display());
        Ok(())
    }
}

impl Storage for JsonFileStore {
    fn load(&self, world: &str) -> Option<WorldSnapshot> {
        match self.read(world) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                error!("Failed to load world '{}': {}", world, e);
                None
            }
        }
    }

    fn save(&self, snapshot: &WorldSnapshot) -> bool {
        match self.write(snapshot) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save world '{}': {}", snapshot.world, e);
                false
            }
        }
    }

    fn load_one(&self, world: &str, key: &str, kind: EntityKind) -> Option<EntityRecord> {
        match self.read(world) {
            Ok(snapshot) => snapshot.record(key, kind).cloned(),
            Err(e) => {
                warn!("Failed to load {} '{}' from world '{}': {}", kind, key, world, e);
                None
            }
        }
    }

    fn store_contains(&self, world: &str, key: &str, kind: EntityKind) -> bool {
        self.read(world)
            .map(|snapshot| snapshot.record(key, kind).is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_sanitized() {
        let store = JsonFileStore::new("/data");
        assert_eq!(store.path_for("World"), PathBuf::from("/data/world.json"));
        assert_eq!(
            store.path_for("../etc/passwd"),
            PathBuf::from("/data/___etc_passwd.json")
        );
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("worlds"));

        let mut snapshot = WorldSnapshot::new("Survival");
        snapshot.upsert(EntityRecord::new(EntityKind::Group, "admin").with_permission("*"));
        assert!(store.save(&snapshot));

        assert!(store.store_contains("survival", "ADMIN", EntityKind::Group));
        let loaded = store.load("survival").unwrap();
        assert_eq!(loaded.groups, snapshot.groups);
        assert!(loaded.saved_at.is_some());
        assert!(!store.path_for("survival").with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_file_is_empty_world() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let snapshot = store.load("nether").unwrap();
        assert!(snapshot.groups.is_empty());
        assert!(store.load_one("nether", "admin", EntityKind::Group).is_none());
    }

    #[test]
    fn test_corrupt_file_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path_for("world"), b"{ not json").unwrap();

        assert!(store.load("world").is_none());
        assert!(!store.store_contains("world", "admin", EntityKind::Group));
        assert!(matches!(
            store.read("world"),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_mismatched_world_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path_for("world"), br#"{"world":"other"}"#).unwrap();

        assert!(matches!(store.read("world"), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_world_names_match_like_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let mut snapshot = WorldSnapshot::new("\u{a7}aSurvival");
        snapshot.upsert(EntityRecord::new(EntityKind::Group, "admin"));
        assert!(store.save(&snapshot));
        assert_eq!(store.path_for("\u{a7}aSurvival"), store.path_for("survival"));
        assert!(store.read("SURVIVAL").is_ok());

        assert!(store.save(&WorldSnapshot::new("\u{c4}rger")));
        assert!(store.read("\u{e4}rger").is_ok());
    }
}
