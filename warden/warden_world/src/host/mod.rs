//! Host hook implementations.

use warden_core::traits::HostHooks;

/// A host that supports nothing.
///
/// Used when a world runs outside any game or server environment, such as in
/// the command-line tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl HostHooks for NoopHost {}
