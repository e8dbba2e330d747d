use cgit_slim::logging::{init_supervisor_logging, init_sync_logging};
use cgit_slim::supervisor::{self, ShutdownCause};
use cgit_slim::sync::{MirrorAction, SyncConfig, SyncDaemon, SystemGit};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, SyncArgs};
use config::Config;

/// Default log level when RUST_LOG is unset
fn default_level(cli: &Cli) -> &'static str {
    if cli.is_verbose() { "debug" } else { "info" }
}

fn run_application(cli: &Cli) -> Result<()> {
    match &cli.command {
        // Default: act as the container init
        None | Some(Commands::Init) => run_init(cli),
        Some(Commands::Sync(args)) => run_sync(cli, args),
    }
}

fn run_init(cli: &Cli) -> Result<()> {
    init_supervisor_logging(default_level(cli));

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("Starting with config from: {:?}", cli.config);

    let outcome = supervisor::supervise(config.services).context("Supervision failed")?;
    match outcome.cause {
        ShutdownCause::ChildExited { role, pid, status } => {
            info!("Group shut down after {} (pid {}) exited with {}", role, pid, status)
        }
        ShutdownCause::Signalled => info!("Group shut down on termination signal"),
        ShutdownCause::NoChildren => info!("Group shut down with no children left"),
    }
    Ok(())
}

fn run_sync(cli: &Cli, args: &SyncArgs) -> Result<()> {
    init_sync_logging(default_level(cli));

    let daemon = SyncDaemon::with_system_git(SyncConfig::from_env());
    if args.dry_run {
        return print_plan(&daemon);
    }
    if args.once {
        daemon.run_once();
    } else {
        daemon.run();
    }
    Ok(())
}

fn print_plan(daemon: &SyncDaemon<SystemGit>) -> Result<()> {
    let list_file = &daemon.config().list_file;
    if !list_file.exists() {
        println!("{} {}", "No repo list found at".yellow(), list_file.display());
        return Ok(());
    }

    let planned = daemon
        .plan_cycle()
        .context(format!("Failed to read {}", list_file.display()))?;
    if planned.is_empty() {
        println!("{}", "No repositories listed".yellow());
    }
    for entry in &planned {
        let verb = match entry.action {
            MirrorAction::Clone { .. } => "clone ".green(),
            MirrorAction::Update { .. } => "update".cyan(),
        };
        println!("{} {} {}", verb, entry.name.bold(), entry.action.target().display());
        println!("       {}", entry.action.to_string().dimmed());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Run the main application logic; an Err here exits with status 1
    run_application(&cli).context("Application failed")?;

    Ok(())
}
