use std::path::PathBuf;

use tracing::trace;

/// Journal backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum JournalConfig {
    /// Memory-only journal (nothing survives a restart)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for JournalConfig {
    fn default() -> Self {
        JournalConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./comments.db")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Hosts (and their services) known at startup
    pub hosts: Option<Vec<HostConfig>>,

    /// Journal configuration (optional - defaults to SQLite)
    pub journal: Option<JournalConfig>,

    /// Expiry sweep interval in seconds
    #[serde(default = "crate::util::get_default_sweep_interval")]
    pub sweep_interval: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct HostConfig {
    pub name: String,
    pub display: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
