//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use safety_core::EngineConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Connection pool size.
    pub pool_size: u32,
    /// How often expired check-ins are swept.
    pub sweep_interval: Duration,
    /// Engine limits.
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:safety.db?mode=rwc` |
    /// | `DB_POOL_SIZE` | Connection pool size | `20` |
    /// | `SAFETY_SWEEP_INTERVAL_SECS` | Check-in sweep interval | `30` |
    ///
    /// Engine limits are read by [`EngineConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:safety.db?mode=rwc".to_string());

        let pool_size = match env::var("DB_POOL_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidPoolSize(raw))?,
            Err(_) => database::Database::DEFAULT_POOL_SIZE,
        };

        let sweep_secs = match env::var("SAFETY_SWEEP_INTERVAL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidSweepInterval(raw))?,
            Err(_) => 30,
        };

        Ok(Self {
            addr,
            database_url,
            pool_size,
            sweep_interval: Duration::from_secs(sweep_secs),
            engine: EngineConfig::from_env(),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,

    #[error("Invalid DB_POOL_SIZE: {0}")]
    InvalidPoolSize(String),

    #[error("Invalid SAFETY_SWEEP_INTERVAL_SECS: {0}")]
    InvalidSweepInterval(String),
}
