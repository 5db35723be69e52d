//! Host environment hooks.

use crate::types::User;

/// Hooks into the environment hosting a world.
///
/// Every method has a conservative default, so a host only overrides what it
/// actually supports.
pub trait HostHooks: Send + Sync {
    /// Apply the effective permissions of `player` inside the host.
    ///
    /// Returns `true` if the host did anything.
    fn setup_player(&self, _world: &str, _player: &str) -> bool {
        false
    }

    /// Apply the effective permissions of every online player.
    fn setup_all(&self, _world: &str) -> bool {
        false
    }

    /// Check whether `user` is currently connected.
    fn is_online(&self, _world: &str, _user: &User) -> bool {
        false
    }
}
