//! CLI subcommand implementations.

pub mod recipes;
pub mod summary;
pub mod watch;
