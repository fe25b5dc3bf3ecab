//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use springboard_core::types::ComponentKind;

/// Springboard - install and remove host extensions and skins
#[derive(Parser, Debug)]
#[command(name = "springboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to springboard.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Host install root, used when no config file is given
    #[arg(long, global = true, env = "SPRINGBOARD_HOST_ROOT")]
    pub host_root: Option<Utf8PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch components and add them to the manifest
    Install(InstallArgs),

    /// Remove a component from the manifest and delete its code
    Uninstall(UninstallArgs),

    /// Show lifecycle status
    Status(StatusArgs),

    /// Print the directives in the manifest
    Manifest,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Component kind (extension or skin)
    pub kind: ComponentKind,

    /// Component names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Repository URL (single component only)
    #[arg(long)]
    pub repository: Option<String>,

    /// Branch to clone; defaults to the host release branch
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Commit to check out after cloning (single component only)
    #[arg(long)]
    pub commit: Option<String>,

    /// Code is already present; do not fetch
    #[arg(long)]
    pub bundled: bool,

    /// Run composer install in the component directory
    #[arg(long)]
    pub composer: bool,

    /// Run the schema migration after installing
    #[arg(long)]
    pub db_update: bool,
}

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Component kind (extension or skin)
    pub kind: ComponentKind,

    /// Component name
    pub name: String,

    /// Code shipped with the host; keep the directory
    #[arg(long)]
    pub bundled: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Component kind (extension or skin)
    pub kind: ComponentKind,

    /// Component names; defaults to every manifest entry of this kind
    pub names: Vec<String>,
}
