//! env_logger setup for the two programs
//!
//! The sync daemon writes timestamped lines to stdout; the supervisor
//! writes short prefixed lines to stderr. `RUST_LOG` overrides the default
//! level in both.

use std::io::Write;

use chrono::{DateTime, Local};
use env_logger::{Env, Target};

/// Timestamp layout for sync daemon log lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `[YYYY-MM-DD HH:MM:SS] message`
pub fn timestamped_line(now: &DateTime<Local>, message: &str) -> String {
    format!("[{}] {}", now.format(TIMESTAMP_FORMAT), message)
}

/// Logging for the sync daemon: stdout, `[timestamp] message`
pub fn init_sync_logging(level: &str) {
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}", timestamped_line(&Local::now(), &record.args().to_string())))
        .init();
}

/// Logging for the supervisor: stderr, `init: message`
pub fn init_supervisor_logging(level: &str) {
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Stderr)
        .format(|buf, record| writeln!(buf, "init: {}", record.args()))
        .init();
}
