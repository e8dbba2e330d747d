//! Sync daemon configuration, resolved once from the environment.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;
use thiserror::Error;

pub const ENV_REPO_LIST: &str = "REPO_LIST";
pub const ENV_GIT_ROOT: &str = "GIT_ROOT";
pub const ENV_INTERVAL: &str = "SYNC_INTERVAL";
pub const ENV_GIT_BIN: &str = "GIT_BIN";

pub const DEFAULT_LIST_FILE: &str = "/etc/cgit/repos.list";
pub const DEFAULT_GIT_ROOT: &str = "/var/lib/git";
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_GIT_BIN: &str = "/bin/git";

/// A `SYNC_INTERVAL` value that is not a positive integer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid interval {0:?}: expected a positive number of seconds")]
pub struct InvalidInterval(pub String);

/// Parse an interval in whole seconds; only strictly positive integers are
/// accepted.
pub fn resolve_interval(raw: &str) -> Result<u64, InvalidInterval> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(InvalidInterval(raw.to_string())),
    }
}

/// Immutable settings for the life of the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Repository list file, re-read every cycle
    pub list_file: PathBuf,
    /// Directory holding one bare mirror per repository
    pub mirror_root: PathBuf,
    /// Sleep between cycles
    pub interval: Duration,
    /// git executable used for every invocation
    pub git_binary: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            list_file: PathBuf::from(DEFAULT_LIST_FILE),
            mirror_root: PathBuf::from(DEFAULT_GIT_ROOT),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            git_binary: PathBuf::from(DEFAULT_GIT_BIN),
        }
    }
}

impl SyncConfig {
    /// Resolve from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Resolve through an arbitrary variable lookup. Unset variables take
    /// their defaults; a malformed interval is logged and replaced by the
    /// default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let defaults = Self::default();
        let path_or = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        let interval = match lookup(ENV_INTERVAL) {
            None => defaults.interval,
            Some(raw) => {
                let raw = raw.to_string_lossy();
                match resolve_interval(&raw) {
                    Ok(secs) => Duration::from_secs(secs),
                    Err(e) => {
                        warn!("Invalid {} ({}), using default {}", ENV_INTERVAL, e, DEFAULT_INTERVAL_SECS);
                        defaults.interval
                    }
                }
            }
        };

        Self {
            list_file: path_or(ENV_REPO_LIST, defaults.list_file),
            mirror_root: path_or(ENV_GIT_ROOT, defaults.mirror_root),
            interval,
            git_binary: path_or(ENV_GIT_BIN, defaults.git_binary),
        }
    }
}
