//! Offline identity lookup.

use uuid::Uuid;
use warden_core::error::IdentityError;
use warden_core::id::normalize;
use warden_core::traits::IdentityLookup;

/// Derives a stable key from the display name alone.
///
/// The key is a name-based (v3) UUID over `OfflinePlayer:<name>`, so the same
/// name always maps to the same key and no service is contacted. This is
/// what a host running without an account service uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

impl OfflineLookup {
    /// Create a new offline lookup.
    pub fn new() -> Self {
        Self
    }

    /// The stable key for `name`.
    pub fn key_for(name: &str) -> Uuid {
        let seed = format!("OfflinePlayer:{}", normalize(name));
        Uuid::new_v3(&Uuid::NAMESPACE_OID, seed.as_bytes())
    }
}

impl IdentityLookup for OfflineLookup {
    fn resolve_stable_key(&self, display_name: &str) -> Result<Uuid, IdentityError> {
        if display_name.trim().is_empty() {
            return Err(IdentityError::LookupFailed(display_name.to_string()));
        }
        Ok(Self::key_for(display_name))
    }
}
