//! Command implementations.

pub mod entity;
pub mod world;

use std::path::Path;
use std::sync::Arc;

use anyhow::bail;
use log::warn;
use warden_core::utils::WardenConfig;
use warden_world::{JsonFileStore, World};

/// Build the named world over a JSON store and load everything it holds.
pub fn open_world(config: &WardenConfig, store: &Path, name: &str) -> anyhow::Result<World> {
    let world_config = config.world_or_default(name);
    if world_config.online_mode {
        warn!(
            "World '{}' is configured for online mode; resolving names offline",
            name
        );
    }

    let world = World::from_config(&world_config, Arc::new(JsonFileStore::new(store)));
    if !world.load() {
        bail!("Failed to load world '{}' from {}", name, store.display());
    }
    Ok(world)
}

/// Persist `world`, turning a failed save into an error.
pub fn save(world: &World) -> anyhow::Result<()> {
    if !world.save() {
        bail!("Failed to save world '{}'", world.name());
    }
    Ok(())
}
