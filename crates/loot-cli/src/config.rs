//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use loot_core::{CostTable, DungeonTable};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log file followed when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Seconds between published snapshots.
    pub refresh_secs: u64,

    /// Milliseconds to wait when the log has no new line.
    pub poll_interval_ms: u64,

    /// Length of the trailing window, and the default for custom ranges.
    pub window_minutes: i64,

    /// Read logs from the top instead of only following new lines.
    pub from_start: bool,

    /// Craftable passes and their costs. Entries merge over the built-in table.
    pub recipes: CostTable,

    /// Chest item names counted as dungeon runs.
    pub dungeons: DungeonTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: None,
            refresh_secs: 1,
            poll_interval_ms: 200,
            window_minutes: 60,
            from_start: false,
            recipes: CostTable::builtin(),
            dungeons: DungeonTable::builtin(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (LOOT_*)
        figment = figment.merge(Env::prefixed("LOOT_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for loot.
///
/// On Linux: `~/.config/loot`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("loot"))
}
