// src/config.rs

use std::path::PathBuf;
use std::time::Duration;
use crate::tasks::cooldown_clock::DEFAULT_TICK_INTERVAL;

pub const APP_DIR_NAME: &str = "couponbook";
pub const LEDGER_FILE_NAME: &str = "ledger.json";

/// Where the engine keeps its state and how often the cooldown clock ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub ledger_path: PathBuf,
    /// `None` uses the bundled catalog.
    pub catalog_path: Option<PathBuf>,
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            catalog_path: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Per-user data directory, e.g. `~/.local/share/couponbook` on Linux.
/// Falls back to the working directory when the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn default_ledger_path() -> PathBuf {
    default_data_dir().join(LEDGER_FILE_NAME)
}
