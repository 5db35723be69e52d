//! Warden command line interface.
//!
//! Each invocation loads one world from a directory of JSON files, runs a
//! single command against it, and saves the world again if the command
//! edited anything.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::debug;
use warden_core::utils::{LogLevel, WardenConfig};

use commands::entity::{GroupArgs, MetaArgs, PermissionArgs, ShowArgs, TargetArgs};
use commands::world::ListArgs;

/// Inspect and edit Warden permission worlds
#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about)]
struct Cli {
    /// Directory holding one JSON file per world
    #[arg(long, env = "WARDEN_STORE")]
    store: PathBuf,

    /// TOML configuration file
    #[arg(long, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// World to operate on
    #[arg(long)]
    world: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an entity's own and effective permissions and metadata
    Show(ShowArgs),

    /// Grant a permission
    Grant(PermissionArgs),

    /// Revoke a permission
    Revoke(PermissionArgs),

    /// Set a metadata value
    #[command(name = "set-meta")]
    SetMeta(MetaArgs),

    /// Add an entity to a group
    #[command(name = "add-group")]
    AddGroup(GroupArgs),

    /// Resolve an entity and report recursive group memberships
    Check(TargetArgs),

    /// Remove entities that carry no data
    Cleanup,

    /// List stored entities of one kind
    List(ListArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => WardenConfig::load(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => WardenConfig::default(),
    };

    let level = cli.log_level.unwrap_or(config.log_level);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.to_level_filter().to_string()),
    )
    .init();

    let world_name = cli
        .world
        .clone()
        .or_else(|| config.default_world.clone())
        .unwrap_or_else(|| "world".to_string());
    debug!("Using world '{}' in {}", world_name, cli.store.display());

    let world = commands::open_world(&config, &cli.store, &world_name)?;

    match &cli.command {
        Commands::Show(args) => commands::entity::show(&world, args),
        Commands::Grant(args) => commands::entity::grant(&world, args),
        Commands::Revoke(args) => commands::entity::revoke(&world, args),
        Commands::SetMeta(args) => commands::entity::set_meta(&world, args),
        Commands::AddGroup(args) => commands::entity::add_group(&world, args),
        Commands::Check(args) => commands::entity::check(&world, args),
        Commands::Cleanup => commands::world::cleanup(&world),
        Commands::List(args) => commands::world::list(&world, args),
    }
}
