//! mirror-sync - standalone entrypoint for the repository mirror daemon
//!
//! Same daemon as `cgit-slim sync`, installed where the service table
//! expects it.

use cgit_slim::logging::init_sync_logging;
use cgit_slim::sync::{SyncConfig, SyncDaemon};
use clap::Parser;

/// Keep bare mirrors of the repositories in REPO_LIST under GIT_ROOT
#[derive(Parser, Debug)]
#[command(name = "mirror-sync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run a single cycle and exit instead of looping
    #[arg(long)]
    once: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_sync_logging(if args.verbose { "debug" } else { "info" });

    let daemon = SyncDaemon::with_system_git(SyncConfig::from_env());
    if args.once {
        daemon.run_once();
    } else {
        daemon.run();
    }
}
