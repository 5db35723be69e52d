//! # Warden Core
//!
//! `warden_core` provides the fundamental building blocks for the Warden
//! permission engine: error types, identity normalization, the entity model,
//! and the collaborator traits a namespace registry talks to.
//!
//! ## Core Concepts
//!
//! 1. **World**: An isolated permission namespace. Entities in one world never
//!    inherit from another.
//!
//! 2. **Entity**: A `User` or a `Group`, each holding its own permissions,
//!    key-value metadata, and the set of groups it directly belongs to.
//!
//! 3. **Effective View**: The flattened permissions and metadata of an entity
//!    after everything inherited through group membership has been merged:
//!    ```text
//!    effective(e) := own(e) ∪ effective(g) for g in groups(e)   (meta: closest wins)
//!    ```
//!
//! 4. **Default Group**: The world-wide group attached to every user the first
//!    time it is materialized.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for all Warden components
//! - **id**: Identity normalization and stable-key handling
//! - **traits**: Storage, identity lookup, and host collaborator interfaces
//! - **types**: The entity model and persisted record types
//! - **utils**: Logging and configuration helpers
//! - **macros**: Logging convenience macros

pub mod error;
pub mod id;
pub mod macros;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export key types and traits for convenience
pub use error::{
    ConfigError, EntityError, Error, IdentityError, RecursiveGroupError, Result, StorageError,
};
pub use id::{normalize, resolve_user_key, strip_color};
pub use traits::{HostHooks, IdentityLookup, Storage};
pub use types::{
    Calculable, EffectiveView, Entity, EntityKind, EntityRecord, Group, User, WorldSnapshot,
};
pub use utils::{LogLevel, WardenConfig, WorldConfig};
