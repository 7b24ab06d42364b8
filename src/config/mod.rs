//! Configuration module for the asset gateway

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub database: DatabaseSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider code: "fake" for local development, "s3" for real signing
    pub provider: String,
    /// Public base URL that completed uploads resolve under
    pub asset_base_url: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores (R2, MinIO)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
}

/// Database configuration for PostgreSQL
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Empty URL disables persistence entirely
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_pool_min_size")]
    pub pool_min_size: u32,
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
    #[serde(default = "default_pool_timeout_secs")]
    pub pool_timeout_secs: u64,
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_pool_min_size() -> u32 {
    1
}

fn default_pool_max_size() -> u32 {
    10
}

fn default_pool_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with ASSET_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Environment variables (ASSET_SERVER__PORT, ASSET_STORAGE__BUCKET, etc.)
            .add_source(
                Environment::with_prefix("ASSET")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations that would misbehave at runtime.
    ///
    /// Pool sizing and timeouts must be coherent before the pool is built;
    /// a bad value here aborts startup instead of failing on first query.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.pool_max_size == 0 {
            return Err(ConfigError::Message(
                "database.pool_max_size must be at least 1".to_string(),
            ));
        }
        if self.database.pool_min_size > self.database.pool_max_size {
            return Err(ConfigError::Message(format!(
                "database.pool_min_size ({}) exceeds pool_max_size ({})",
                self.database.pool_min_size, self.database.pool_max_size
            )));
        }
        if self.database.pool_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "database.pool_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: None,
            },
            storage: StorageSettings {
                provider: "fake".to_string(),
                asset_base_url: "http://localhost:8080/assets".to_string(),
                bucket: String::new(),
                region: default_region(),
                endpoint: None,
                access_key_id: String::new(),
                secret_access_key: String::new(),
            },
            database: DatabaseSettings {
                url: String::new(),
                pool_min_size: default_pool_min_size(),
                pool_max_size: default_pool_max_size(),
                pool_timeout_secs: default_pool_timeout_secs(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_pass_validation() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn min_size_above_max_size_is_rejected() {
        let mut settings = Settings::default();
        settings.database.pool_min_size = 20;
        settings.database.pool_max_size = 5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_max_size_is_rejected() {
        let mut settings = Settings::default();
        settings.database.pool_max_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut settings = Settings::default();
        settings.database.pool_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }
}
