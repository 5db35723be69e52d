//! Configuration.
//!
//! Warden is configured from a TOML document listing the worlds to manage
//! and the default group each of them attaches to new users.
//!
//! ```toml
//! log_level = "debug"
//! default_world = "survival"
//!
//! [[worlds]]
//! name = "survival"
//! default_group = "member"
//!
//! [[worlds]]
//! name = "creative"
//! auto_cleanup = true
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::LogLevel;
use crate::error::ConfigError;

/// Configuration of a single world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// World name
    pub name: String,

    /// Group attached to every newly materialized user
    #[serde(default = "default_group")]
    pub default_group: String,

    /// Resolve display names through an online lookup rather than offline keys
    #[serde(default)]
    pub online_mode: bool,

    /// Run a cleanup pass right after the world is loaded
    #[serde(default)]
    pub auto_cleanup: bool,
}

fn default_group() -> String {
    "default".to_string()
}

impl WorldConfig {
    /// Create a world configuration with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_group: default_group(),
            online_mode: false,
            auto_cleanup: false,
        }
    }

    /// Set the default group.
    pub fn with_default_group(mut self, group: impl Into<String>) -> Self {
        self.default_group = group.into();
        self
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Minimum level that is logged
    #[serde(default)]
    pub log_level: LogLevel,

    /// World used when a command does not name one
    #[serde(default)]
    pub default_world: Option<String>,

    /// Configured worlds
    #[serde(default)]
    pub worlds: Vec<WorldConfig>,
}

impl WardenConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(input).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&input)
    }

    /// Check that world names are present and unique (case-insensitive).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for world in &self.worlds {
            let name = world.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid("world name is empty".to_string()));
            }
            if world.default_group.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "world '{}' has an empty default group",
                    name
                )));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "world '{}' is configured more than once",
                    name
                )));
            }
        }

        if let Some(default_world) = &self.default_world {
            if !self.worlds.is_empty() && self.world(default_world).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "default world '{}' is not configured",
                    default_world
                )));
            }
        }

        Ok(())
    }

    /// Find a world by name (case-insensitive).
    pub fn world(&self, name: &str) -> Option<&WorldConfig> {
        self.worlds
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
    }

    /// The configuration for `name`, or a default one if it is not listed.
    pub fn world_or_default(&self, name: &str) -> WorldConfig {
        self.world(name)
            .cloned()
            .unwrap_or_else(|| WorldConfig::new(name))
    }
}
