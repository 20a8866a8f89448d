/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required, `DB_URL` accepted)
/// - `DATABASE_MAX_CONNECTIONS` (default 5)
/// - `SWEEP_INTERVAL_SECS` (default 60, must be positive)

use std::env;
use std::time::Duration;

/// Configuration errors
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub sweep_interval: Duration,
}

impl WorkerConfig {
    /// Loads configuration from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("DB_URL"))
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = positive(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        let interval_secs = positive(&lookup, "SWEEP_INTERVAL_SECS", 60)?;

        Ok(Self {
            database_url,
            max_connections: max_connections as u32,
            sweep_interval: Duration::from_secs(interval_secs),
        })
    }
}

fn positive<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 && value <= u64::from(u32::MAX) => Ok(value),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
