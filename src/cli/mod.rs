//! CLI module for thryve
//!
//! Contains argument parsing and command implementations.

pub mod args;
pub mod commands;
pub mod completions;

pub use args::{CallCommand, Cli, Commands, ConfigCommand, ProfileCommand, ReportCommand};
