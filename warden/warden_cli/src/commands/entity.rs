//! Commands that act on a single user or group.

use std::collections::BTreeMap;

use clap::Args;
use log::warn;
use warden_core::id::normalize;
use warden_core::require_entity;
use warden_core::types::{Entity, EntityKind};
use warden_world::World;

/// An entity named on the command line
#[derive(Args)]
pub struct TargetArgs {
    /// Entity kind (user or group)
    pub kind: EntityKind,

    /// Display name or stable key
    pub name: String,
}

/// Arguments for the show command
#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the grant and revoke commands
#[derive(Args)]
pub struct PermissionArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Permission node
    pub permission: String,
}

/// Arguments for the set-meta command
#[derive(Args)]
pub struct MetaArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Metadata key
    pub key: String,

    /// Metadata value
    pub value: String,
}

/// Arguments for the add-group command
#[derive(Args)]
pub struct GroupArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Group to join
    pub group: String,
}

/// Look up an entity that must already exist in the loaded world.
fn existing(world: &World, target: &TargetArgs) -> anyhow::Result<Entity> {
    let cached = if world.contains(&target.name, target.kind)? {
        Some(world.get(&target.name, target.kind)?)
    } else {
        None
    };
    Ok(require_entity!(cached, target.kind, normalize(&target.name)))
}

/// Resolve after an edit and save. A cycle leaves the previous view in place
/// and is only reported; the edit itself is still saved.
fn commit(world: &World, entity: &Entity) -> anyhow::Result<()> {
    if let Err(err) = world.recalculate(entity) {
        warn!("{} '{}' not resolved: {}", entity.kind(), entity.key(), err);
    }
    super::save(world)
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let items: Vec<&str> = items.into_iter().map(String::as_str).collect();
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

fn join_meta(meta: &BTreeMap<String, String>) -> String {
    if meta.is_empty() {
        return "(none)".to_string();
    }
    meta.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print an entity's own data and its effective view.
pub fn show(world: &World, args: &ShowArgs) -> anyhow::Result<()> {
    let entity = existing(world, &args.target)?;
    let own = entity.own();
    let effective = entity.effective();
    let display_name = entity.as_user().and_then(|u| u.display_name());

    if args.json {
        let value = serde_json::json!({
            "kind": entity.kind(),
            "key": entity.key(),
            "display_name": display_name,
            "permissions": own.permissions,
            "meta": own.meta,
            "groups": own.groups,
            "effective": {
                "permissions": effective.permissions,
                "meta": effective.meta,
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", entity.kind(), entity.key());
    if let Some(name) = display_name {
        println!("display name: {}", name);
    }
    println!("permissions: {}", join(&own.permissions));
    println!("meta: {}", join_meta(&own.meta));
    println!("groups: {}", join(&own.groups));
    println!("effective permissions: {}", join(&effective.permissions));
    println!("effective meta: {}", join_meta(&effective.meta));
    Ok(())
}

/// Grant a permission, creating the entity if needed.
pub fn grant(world: &World, args: &PermissionArgs) -> anyhow::Result<()> {
    let entity = world.get(&args.target.name, args.target.kind)?;
    if entity.add_permission(args.permission.clone()) {
        println!("Granted {} to {} {}", args.permission, entity.kind(), entity.key());
    } else {
        println!("{} {} already has {}", entity.kind(), entity.key(), args.permission);
    }
    commit(world, &entity)
}

/// Revoke a permission from an existing entity.
pub fn revoke(world: &World, args: &PermissionArgs) -> anyhow::Result<()> {
    let entity = existing(world, &args.target)?;
    if entity.remove_permission(&args.permission) {
        println!("Revoked {} from {} {}", args.permission, entity.kind(), entity.key());
    } else {
        println!("{} {} does not have {}", entity.kind(), entity.key(), args.permission);
    }
    commit(world, &entity)
}

/// Set a metadata value, creating the entity if needed.
pub fn set_meta(world: &World, args: &MetaArgs) -> anyhow::Result<()> {
    let entity = world.get(&args.target.name, args.target.kind)?;
    entity.set_meta(args.key.clone(), args.value.clone());
    println!(
        "Set {}={} on {} {}",
        args.key,
        args.value,
        entity.kind(),
        entity.key()
    );
    commit(world, &entity)
}

/// Add an entity to a group, creating both if needed.
pub fn add_group(world: &World, args: &GroupArgs) -> anyhow::Result<()> {
    let entity = world.get(&args.target.name, args.target.kind)?;
    let group = world.get_group(&args.group);
    if entity.add_group(group.key()) {
        println!("Added {} {} to group {}", entity.kind(), entity.key(), group.key());
    } else {
        println!("{} {} is already in group {}", entity.kind(), entity.key(), group.key());
    }
    commit(world, &entity)
}

/// Resolve an entity, failing if its group memberships are recursive.
pub fn check(world: &World, args: &TargetArgs) -> anyhow::Result<()> {
    let entity = existing(world, args)?;
    world.recalculate(&entity)?;

    println!(
        "{} {} resolves: {} permissions, {} meta keys, {} direct groups",
        entity.kind(),
        entity.key(),
        entity.effective_permissions().len(),
        entity.effective_meta().len(),
        entity.groups().len()
    );
    Ok(())
}
