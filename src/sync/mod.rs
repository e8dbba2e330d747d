//! Repository mirror sync daemon
//!
//! Reads a list of remote URLs and keeps one bare mirror per URL under the
//! mirror root, cloning what is missing and fetch-and-pruning the rest, on
//! a fixed interval.

pub mod config;
pub mod daemon;
pub mod git;
pub mod list;

pub use config::*;
pub use daemon::*;
pub use git::*;
pub use list::*;
