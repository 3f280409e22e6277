//! Loot analyzer CLI library.
//!
//! This crate provides the CLI interface for the loot analyzer.

mod cli;
pub mod commands;
mod config;
pub mod report;

pub use cli::{Cli, Commands, WatchArgs};
pub use config::Config;
