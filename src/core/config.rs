//! Store configuration, read from `<root>/bgcstore.toml` when present.

use crate::core::error::StoreError;
use crate::core::pool::PoolSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "bgcstore.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file name, relative to the store root.
    pub db_file: String,
    /// Actor recorded on every audit event.
    pub actor: String,
    pub audit_log: bool,
    pub audit_file: String,
    pub write_busy_timeout_secs: u32,
    pub read_busy_timeout_secs: u32,
    pub max_busy_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_file: "bgcstore.db".to_string(),
            actor: "bgcstore".to_string(),
            audit_log: true,
            audit_file: "store.events.jsonl".to_string(),
            write_busy_timeout_secs: 30,
            read_busy_timeout_secs: 15,
            max_busy_retries: 5,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        toml::from_str(content).map_err(|e| StoreError::ConfigError(e.to_string()))
    }

    /// No config file = defaults (not an error).
    pub fn load(root: &Path) -> Result<Self, StoreError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&config_path).map_err(StoreError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            write_busy_timeout_secs: self.write_busy_timeout_secs,
            read_busy_timeout_secs: self.read_busy_timeout_secs,
            max_busy_retries: self.max_busy_retries,
        }
    }
}
