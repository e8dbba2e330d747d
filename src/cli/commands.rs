//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - init: supervise the service group (default)
//! - sync: run the mirror sync daemon

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// cgit-slim - container init and repository mirror daemon
#[derive(Parser, Debug)]
#[command(name = "cgit-slim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch and supervise the fcgi, sync and web services
    Init,

    /// Mirror the repositories in REPO_LIST under GIT_ROOT
    Sync(SyncArgs),
}

/// Options for the sync daemon
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncArgs {
    /// Run a single cycle and exit instead of looping
    #[arg(long)]
    pub once: bool,

    /// Print what each entry would do without running git
    #[arg(long, conflicts_with = "once")]
    pub dry_run: bool,
}
