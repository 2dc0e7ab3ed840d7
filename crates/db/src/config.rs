//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Tenancy behavior configuration.
    #[serde(default)]
    pub tenancy: TenancyConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Tenancy behavior configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TenancyConfig {
    /// Skip re-issuing the session tenant setting while the binder believes
    /// it is already bound. Trades a small leak window after unexpected
    /// resets for less per-statement overhead. Off by default.
    #[serde(default)]
    pub limit_set_calls: bool,
    /// Capacity of the per-schema metadata cache.
    #[serde(default = "default_metadata_cache_capacity")]
    pub metadata_cache_capacity: u64,
}

fn default_metadata_cache_capacity() -> u64 {
    1024
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            limit_set_calls: false,
            metadata_cache_capacity: default_metadata_cache_capacity(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ROWFENCE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
