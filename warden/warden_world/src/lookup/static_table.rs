//! Table-backed identity lookup.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;
use warden_core::error::IdentityError;
use warden_core::id::normalize;
use warden_core::traits::IdentityLookup;

/// Answers lookups from an explicit name-to-key table.
///
/// Unknown names fail with `IdentityError::LookupFailed`, which makes this
/// the stand-in for an online account service in tests and tools.
#[derive(Debug, Default)]
pub struct StaticLookup {
    entries: RwLock<HashMap<String, Uuid>>,
}

impl StaticLookup {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with the given key, replacing any previous one.
    pub fn insert(&self, name: &str, key: Uuid) -> Option<Uuid> {
        self.entries.write().insert(normalize(name), key)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, name: &str, key: Uuid) -> Self {
        self.insert(name, key);
        self
    }

    /// Forget `name`.
    pub fn remove(&self, name: &str) -> Option<Uuid> {
        self.entries.write().remove(&normalize(name))
    }
}

impl IdentityLookup for StaticLookup {
    fn resolve_stable_key(&self, display_name: &str) -> Result<Uuid, IdentityError> {
        self.entries
            .read()
            .get(&normalize(display_name))
            .copied()
            .ok_or_else(|| IdentityError::LookupFailed(display_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_lookup() {
        let key = Uuid::new_v4();
        let lookup = StaticLookup::new().with("Alice", key);

        assert_eq!(lookup.resolve_stable_key("ALICE").unwrap(), key);
        assert_eq!(
            lookup.resolve_stable_key("bob"),
            Err(IdentityError::LookupFailed("bob".to_string()))
        );

        assert_eq!(lookup.remove("alice"), Some(key));
        assert!(lookup.resolve_stable_key("alice").is_err());
    }
}
