use crate::DEFAULT_CONFIG;
use clap::{Args, Parser, Subcommand};
use hatchery_core::ids::{Identity, RegistryRef};
use std::path::PathBuf;

///
/// Cli
///

#[derive(Debug, Parser)]
#[command(name = "hatchery", version, about = "Deploy and inspect blueprint registries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy a blueprint and an initialized registry to a profile's ledger
    Deploy(DeployArgs),

    /// Print a registry's roles, blueprint and instances
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Profile from the config file
    #[arg(long)]
    pub profile: String,

    /// Config file path
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Initial admin (default: the profile deployer)
    #[arg(long, value_name = "PRINCIPAL")]
    pub admin: Option<Identity>,

    /// Initial upgrader (default: the profile deployer)
    #[arg(long, value_name = "PRINCIPAL")]
    pub upgrader: Option<Identity>,

    /// Checkpoint file (default: .hatchery/<profile>.checkpoint.json)
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    /// Ignore any existing checkpoint and start over
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Profile from the config file
    #[arg(long)]
    pub profile: String,

    /// Config file path
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Registry address
    #[arg(long, value_name = "PRINCIPAL")]
    pub registry: RegistryRef,
}

///
/// TESTS
///
