//! Identity lookup collaborator.

use uuid::Uuid;

use crate::error::IdentityError;
use crate::id::is_uuid;

/// Translates human-readable user names into stable keys.
///
/// Only user lookups go through this trait; groups are keyed by name.
pub trait IdentityLookup: Send + Sync {
    /// Resolve the stable key of a display name.
    ///
    /// # Returns
    ///
    /// * `Ok(Uuid)` - The stable key.
    /// * `Err(IdentityError)` - If the name is unknown or the service failed.
    fn resolve_stable_key(&self, display_name: &str) -> Result<Uuid, IdentityError>;

    /// Check whether `s` is already a stable key.
    fn is_stable_key_shaped(&self, s: &str) -> bool {
        is_uuid(s)
    }
}
