//! Collaborator interfaces.
//!
//! A world does not know how entities are stored, how display names map to
//! stable keys, or when its host considers a user online. These traits are
//! the seams where those collaborators plug in.

pub mod host;
pub mod identity;
pub mod storage;

pub use host::HostHooks;
pub use identity::IdentityLookup;
pub use storage::Storage;
