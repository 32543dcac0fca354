//! Engine configuration file
//!
//! ```json
//! {
//!   "database_path": "./collection.db",
//!   "busy_timeout_ms": 5000,
//!   "default_limit": 500,
//!   "field_names": ["Front", "Back"]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::SelEngine;
use crate::observability::Event;
use crate::schema::FieldCatalog;
use crate::store::SqliteStore;

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// SQLite database file (required)
    pub database_path: String,

    /// How long a read waits on a locked database (optional, default 5s)
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Limit for top-level queries without one (optional)
    #[serde(default)]
    pub default_limit: Option<u64>,

    /// Explicit field catalogue. Loaded from the store when absent.
    #[serde(default)]
    pub field_names: Option<Vec<String>>,
}

fn default_busy_timeout() -> u64 {
    5000
}

impl EngineConfig {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        let config = Self::from_json(&content)?;
        info!(path = %path.display(), "{}", Event::ConfigLoaded);
        Ok(config)
    }

    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.database_path.trim().is_empty() {
            return Err(CliError::config_error("database_path must not be empty"));
        }
        if self.busy_timeout_ms == 0 {
            return Err(CliError::config_error("busy_timeout_ms must be > 0"));
        }
        if self.default_limit == Some(0) {
            return Err(CliError::config_error("default_limit must be > 0"));
        }
        Ok(())
    }

    pub fn database(&self) -> &Path {
        Path::new(&self.database_path)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Opens the store read-only and builds an engine over it
    pub fn open_engine(&self) -> CliResult<SelEngine<SqliteStore>> {
        let store = SqliteStore::open(self.database(), self.busy_timeout())?;
        let catalog = match &self.field_names {
            Some(names) => FieldCatalog::uniform(names.iter().cloned()),
            None => store.load_field_catalog()?,
        };
        Ok(SelEngine::new(store, catalog).with_default_limit(self.default_limit))
    }
}
