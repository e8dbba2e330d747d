//! git subprocess invocation
//!
//! Every git operation is a blocking child process; the daemon waits for
//! each to exit before moving on.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Runs git with an argument vector and waits for it to exit
pub trait GitRunner {
    fn run(&self, args: &[OsString]) -> io::Result<ExitStatus>;
}

/// git as an OS process, stdio inherited from the daemon
#[derive(Debug, Clone)]
pub struct SystemGit {
    binary: PathBuf,
}

impl SystemGit {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl GitRunner for SystemGit {
    fn run(&self, args: &[OsString]) -> io::Result<ExitStatus> {
        Command::new(&self.binary).args(args).status()
    }
}

/// Arguments that mark every directory as safe for git operations
pub fn safe_directory_args() -> Vec<OsString> {
    ["config", "--global", "--add", "safe.directory", "*"]
        .into_iter()
        .map(OsString::from)
        .collect()
}

/// What one list entry needs this cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorAction {
    /// No mirror directory yet: create a bare mirror
    Clone { url: String, target: PathBuf },
    /// Mirror exists: fetch and prune
    Update { target: PathBuf },
}

impl MirrorAction {
    /// Decide between clone and update from the state of `target`. A path
    /// that exists but is not a directory still gets a clone attempt.
    pub fn for_target(url: &str, target: PathBuf) -> Self {
        if target.is_dir() {
            MirrorAction::Update { target }
        } else {
            MirrorAction::Clone {
                url: url.to_string(),
                target,
            }
        }
    }

    pub fn target(&self) -> &Path {
        match self {
            MirrorAction::Clone { target, .. } | MirrorAction::Update { target } => target,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            MirrorAction::Clone { .. } => "clone",
            MirrorAction::Update { .. } => "update",
        }
    }

    /// git argument vector for this action
    pub fn args(&self) -> Vec<OsString> {
        match self {
            MirrorAction::Clone { url, target } => vec![
                OsString::from("clone"),
                OsString::from("-4"),
                OsString::from("--mirror"),
                OsString::from(url),
                target.as_os_str().to_owned(),
            ],
            MirrorAction::Update { target } => vec![
                OsString::from("-C"),
                target.as_os_str().to_owned(),
                OsString::from("remote"),
                OsString::from("update"),
                OsString::from("--prune"),
            ],
        }
    }
}

impl fmt::Display for MirrorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git {}", display_args(&self.args()))
    }
}

/// Render an argument vector for log lines
pub fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
