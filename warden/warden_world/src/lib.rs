//! # Warden World
//!
//! `warden_world` provides the per-world registry of users and groups and the
//! collaborators it ships with.
//!
//! Key concepts:
//!
//! 1. **World**: Owns two caches (users and groups) keyed by normalized
//!    identity. Entities are hydrated from storage on first access, created
//!    empty when storage has nothing, and resolved before they are returned.
//!
//! 2. **World Manager**: An explicitly constructed collection of worlds
//!    keyed by case-insensitive name.
//!
//! 3. **Storage**: `InMemoryStore` for tests and embedding, `JsonFileStore`
//!    for one JSON document per world on disk.
//!
//! 4. **Identity Lookup**: `OfflineLookup` derives stable keys from names,
//!    `StaticLookup` answers from a fixed table.

pub mod host;
pub mod lookup;
pub mod manager;
pub mod store;
pub mod world;

// Re-export key types for convenience
pub use host::NoopHost;
pub use lookup::{OfflineLookup, StaticLookup};
pub use manager::WorldManager;
pub use store::{InMemoryStore, JsonFileStore};
pub use world::{CleanupReport, World};
