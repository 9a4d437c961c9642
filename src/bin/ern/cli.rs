//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

/// ern - native dependency management for mini-app containers
#[derive(Parser)]
#[command(name = "ern")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List information about modules
    List(ListArgs),

    /// Add dependencies to the mini-app in the current directory
    Add(AddArgs),

    /// Upgrade the mini-app in the current directory to a platform version
    Upgrade(UpgradeArgs),

    /// Cauldron access
    Cauldron(CauldronArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Manifest selection shared by commands that reconcile against it.
#[derive(Args, Clone, Default)]
pub struct ManifestArgs {
    /// Path to the manifest (overrides `[manifest] path`)
    #[arg(long, env = "ERN_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Platform version to resolve against (overrides `[manifest] platform-version`)
    #[arg(long)]
    pub platform_version: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(subcommand)]
    pub command: ListCommands,
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// List the native dependencies of a module
    Dependencies(ListDependenciesArgs),
}

#[derive(Args)]
pub struct ListDependenciesArgs {
    /// Module directory or package path (defaults to the current directory)
    pub module: Option<String>,

    /// Print a single JSON object instead of grouped text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub manifest: ManifestArgs,
}

#[derive(Args)]
pub struct AddArgs {
    /// Packages to add (name, name@version, git or file path)
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Add as devDependencies
    #[arg(long, conflicts_with = "peer")]
    pub dev: bool,

    /// Add as peerDependencies
    #[arg(long)]
    pub peer: bool,

    #[command(flatten)]
    pub manifest: ManifestArgs,
}

#[derive(Args)]
pub struct UpgradeArgs {
    /// Platform version to upgrade to
    #[arg(long)]
    pub platform_version: String,

    /// Path to the manifest (overrides `[manifest] path`)
    #[arg(long, env = "ERN_MANIFEST")]
    pub manifest: Option<PathBuf>,
}

#[derive(Args)]
pub struct CauldronArgs {
    /// Path to the cauldron document (overrides `[cauldron] path`)
    #[arg(long, global = true, env = "ERN_CAULDRON")]
    pub cauldron: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CauldronCommands,
}

#[derive(Subcommand)]
pub enum CauldronCommands {
    /// Record the native dependencies of a composite for an application version
    Sync(CauldronSyncArgs),

    /// Show the record of an application version
    Get(CauldronGetArgs),
}

#[derive(Args)]
pub struct CauldronSyncArgs {
    /// Application version descriptor (name:platform:version)
    pub descriptor: String,

    /// Composite directory to scan (defaults to the current directory)
    #[arg(long)]
    pub composite: Option<PathBuf>,

    /// Mini-apps included in the container
    #[arg(long = "mini-app")]
    pub mini_apps: Vec<String>,

    /// Container version to record instead of a patch bump
    #[arg(long)]
    pub container_version: Option<String>,

    #[command(flatten)]
    pub manifest: ManifestArgs,
}

#[derive(Args)]
pub struct CauldronGetArgs {
    /// Application version descriptor (name:platform:version)
    pub descriptor: String,

    /// Print the record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}
