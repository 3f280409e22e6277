//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Loot analyzer for the game client's chat log.
///
/// Follows the log as it grows and reports currency and item income,
/// netting out the cost of crafted passes.
#[derive(Debug, Parser)]
#[command(name = "loot", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Follow a log file and print live statistics.
    ///
    /// Control commands are read from stdin: `crafted <pass>`,
    /// `dropped <pass>`, `drop <pass> <count>`, `drop-last`, `reset`, `quit`.
    Watch(WatchArgs),

    /// Print statistics over an entire log file.
    Summary {
        /// The log file to read.
        log: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the crafting recipes in effect.
    Recipes,
}

/// Options for `loot watch`.
#[derive(Debug, Clone, Default, Args)]
pub struct WatchArgs {
    /// The log file to follow. Defaults to `log_path` from the config.
    pub log: Option<PathBuf>,

    /// Time range: trailing, last-1-hour, today, this-week, all-time, custom.
    #[arg(short, long)]
    pub range: Option<String>,

    /// Window length in minutes for `trailing` and `custom`.
    #[arg(short, long)]
    pub minutes: Option<i64>,

    /// Seconds between published snapshots.
    #[arg(long)]
    pub refresh: Option<u64>,

    /// Read the whole file instead of only new lines.
    #[arg(long)]
    pub from_start: bool,

    /// Output one JSON document per snapshot.
    #[arg(long)]
    pub json: bool,
}
