//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Wheelwright - Reproducible build-environment provisioner
///
/// Assembles a working toolchain (system packages, a pinned simulation
/// engine, a Python dependency set) with cache-aware wheel builds, then
/// runs gated static-analysis and test stages.
#[derive(Parser, Debug)]
#[command(name = "wheelwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "WHEELWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full provisioning pipeline
    Provision(ProvisionArgs),

    /// Run only the two static-analysis passes
    Lint(LintArgs),

    /// Run only the test stage
    Test(TestArgs),

    /// Check availability of the external collaborators
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Manage the persistent wheel cache
    Cache(CacheArgs),
}

/// Arguments for the provision command
#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Engine version to select from the matrix (defaults to the first entry)
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Python interpreter override
    #[arg(long)]
    pub python: Option<String>,

    /// Drop any existing cache entry for this key and rebuild
    #[arg(long)]
    pub fresh: bool,
}

/// Arguments for the lint command
#[derive(Parser, Debug)]
pub struct LintArgs {
    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Run only the fail-fast gate pass
    #[arg(long)]
    pub gate_only: bool,
}

/// Arguments for the test command
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List all cache entries
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the cache key and hit/miss state for a project
    Info {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// Remove entries older than the configured age
    Gc {
        /// Remove entries older than N days (default: from config)
        #[arg(long)]
        days: Option<u32>,

        /// Dry run - show what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove all cache entries
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}
