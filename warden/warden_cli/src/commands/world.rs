//! Commands that act on the whole world.

use clap::Args;
use warden_core::types::EntityKind;
use warden_world::World;

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    /// Entity kind (user or group)
    pub kind: EntityKind,
}

/// Run a cleanup pass and report what went.
pub fn cleanup(world: &World) -> anyhow::Result<()> {
    let report = world.cleanup();
    println!(
        "Removed {} users and {} groups from world {}",
        report.users_removed,
        report.groups_removed,
        world.name()
    );
    if !report.saved {
        anyhow::bail!("Failed to save world '{}' after cleanup", world.name());
    }
    Ok(())
}

/// Print every loaded entity of one kind, one per line, sorted by key.
///
/// Users are followed by their display name when one is known.
pub fn list(world: &World, args: &ListArgs) -> anyhow::Result<()> {
    let mut entities = world.get_all(args.kind);
    entities.sort_by(|a, b| a.key().cmp(b.key()));

    for entity in &entities {
        match entity.as_user().and_then(|u| u.display_name()) {
            Some(name) => println!("{} ({})", entity.key(), name),
            None => println!("{}", entity.key()),
        }
    }
    Ok(())
}
