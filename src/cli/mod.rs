//! CLI module for cgit-slim - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for the supervisor and
//! the mirror sync daemon.

pub mod commands;

pub use commands::Cli;
