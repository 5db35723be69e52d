//! Error types for the Warden permission engine.
//!
//! The errors are organized by subsystem, with each subsystem having its own
//! error type. The root error type, `Error`, can wrap any of them so callers
//! that do not care about the distinction can use a single `Result`.
//!
//! None of these errors is fatal: a cycle in one group graph or an unknown
//! display name must never prevent unrelated lookups.

use std::fmt;

use thiserror::Error;

use crate::types::EntityKind;

/// Root error type for Warden.
#[derive(Debug, Error)]
pub enum Error {
    /// A cycle was found in the group membership graph
    #[error("Resolution error: {0}")]
    RecursiveGroup(#[from] RecursiveGroupError),

    /// A display name could not be translated to a stable key
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// An entity was malformed or of an unknown kind
    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias used throughout Warden.
pub type Result<T> = std::result::Result<T, Error>;

/// A cycle in the group membership graph.
///
/// `cycle` lists the group keys in traversal order, starting with the group
/// that was re-entered. Resolving `a` with edges `a -> b -> c -> a` yields
/// `["a", "b", "c"]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct RecursiveGroupError {
    /// Ordered group keys forming the cycle.
    pub cycle: Vec<String>,
}

impl RecursiveGroupError {
    /// Create a new error for the given cycle.
    pub fn new(cycle: Vec<String>) -> Self {
        Self { cycle }
    }
}

impl fmt::Display for RecursiveGroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recursive group membership: ")?;
        for key in &self.cycle {
            write!(f, "{} -> ", key)?;
        }
        match self.cycle.first() {
            Some(first) => write!(f, "{}", first),
            None => write!(f, "<empty>"),
        }
    }
}

/// Errors related to identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The lookup service does not know the given display name
    #[error("Could not resolve a stable key for '{0}'")]
    LookupFailed(String),
}

/// Errors related to entity handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The kind tag was neither a user nor a group
    #[error("Entity kind '{0}' is neither user nor group")]
    Misclassified(String),

    /// The entity is not present in the world
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Kind that was looked up
        kind: EntityKind,

        /// Normalized name that was looked up
        name: String,
    },
}

/// Errors raised inside storage backends.
///
/// The registry only sees success or failure from the `Storage` trait; these
/// are logged by the backend before they are flattened.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored data is structurally invalid
    #[error("Corrupt store: {0}")]
    Corrupt(String),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    /// The configuration file is not valid TOML
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The configuration is well-formed but semantically wrong
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursive_group_display() {
        let err = RecursiveGroupError::new(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(
            err.to_string(),
            "recursive group membership: a -> b -> c -> a"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = IdentityError::LookupFailed("Notch".into()).into();
        assert!(matches!(err, Error::Identity(IdentityError::LookupFailed(_))));

        let err: Error = EntityError::Misclassified("console".into()).into();
        assert!(err.to_string().contains("console"));
    }

    #[test]
    fn test_not_found_display() {
        let err = EntityError::NotFound {
            kind: EntityKind::Group,
            name: "admin".into(),
        };
        assert_eq!(err.to_string(), "group 'admin' not found");
    }
}
