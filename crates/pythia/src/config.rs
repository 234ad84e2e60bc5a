//! Configuration for the Pythia indexer.

use crate::blacklist::DEFAULT_PATTERNS;
use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration, loaded from `~/.pythia/pythia.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Path to the SQLite database
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory trees to index
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Blacklist patterns (regex, search-anywhere)
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,
}

fn default_database_path() -> String {
    pythia_logging::pythia_home()
        .join("pythia.sqlite3")
        .to_string_lossy()
        .to_string()
}

fn default_blacklist() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            roots: Vec::new(),
            blacklist: default_blacklist(),
        }
    }
}

impl CrawlConfig {
    /// Default configuration file location: `~/.pythia/pythia.toml`.
    pub fn default_path() -> PathBuf {
        pythia_logging::pythia_home().join("pythia.toml")
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CrawlConfig =
            toml::from_str(&content).map_err(|e| CrawlError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CrawlError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Expand a leading `~` against the user's home directory.
    pub fn expand_root(path: &Path) -> PathBuf {
        if path.starts_with("~") {
            if let Some(home) = dirs::home_dir() {
                return home.join(path.strip_prefix("~").unwrap_or(path));
            }
        }
        path.to_path_buf()
    }
}
