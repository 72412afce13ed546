//! Adaptor settings loaded from TOML.
//!
//! ```toml
//! include_hidden = false
//!
//! [connection]
//! database_type = "mysql"
//! pool_size = 10
//! timeout_seconds = 10
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::location::DatabaseType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Settings shared by adaptors and location resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptorSettings {
    /// Keep hidden pages, collections and descriptions when loading.
    pub include_hidden: bool,

    /// Defaults applied when resolving database locations.
    pub connection: ConnectionDefaults,
}

impl Default for AdaptorSettings {
    fn default() -> Self {
        Self {
            include_hidden: false,
            connection: ConnectionDefaults::default(),
        }
    }
}

impl AdaptorSettings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::FileNotFound` - the file does not exist
    /// * `ConfigurationError::FileAccessError` - the file cannot be read
    /// * `ConfigurationError::ParseError` - the file is not valid settings TOML
    pub fn load(path: &Path) -> ConfigurationResult<Self> {
        debug!("Loading adaptor settings from {:?}", path);

        if !path.exists() {
            return Err(ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigurationError::FileAccessError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ConfigurationResult<Self> {
        toml::from_str(content).map_err(|e| ConfigurationError::ParseError {
            reason: format!("adaptor settings: {}", e),
        })
    }
}

/// Defaults applied to database locations that leave them unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionDefaults {
    /// Database type used when neither type nor driver is given.
    pub database_type: DatabaseType,

    /// Driver paired with the default database type; when unset the
    /// database type's own default driver is used.
    pub driver: Option<String>,

    /// Pool size handed to the connection pool.
    pub pool_size: u32,

    /// Upper bound on eager connection validation.
    pub timeout_seconds: u64,
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            database_type: DatabaseType::MySql,
            driver: None,
            pool_size: DEFAULT_POOL_SIZE,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl ConnectionDefaults {
    /// Driver applied together with the default database type.
    pub fn driver(&self) -> String {
        self.driver
            .clone()
            .unwrap_or_else(|| self.database_type.default_driver().to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
