use std::time::Duration;

use crate::dispatcher::DEFAULT_POLL_INTERVAL;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Delay between two claim attempts when the queue is empty.
    pub poll_interval: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a number of milliseconds, got '{value}'")]
    InvalidInterval { name: &'static str, value: String },
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default  |
    /// |-----------------------------|----------|
    /// | `DATABASE_URL`              | required |
    /// | `DISPATCH_POLL_INTERVAL_MS` | `1000`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let poll_interval = parse_interval(std::env::var("DISPATCH_POLL_INTERVAL_MS").ok())?;
        Ok(Self {
            database_url,
            poll_interval,
        })
    }
}

/// Parse a poll interval in milliseconds; unset means the default.
pub fn parse_interval(raw: Option<String>) -> Result<Duration, ConfigError> {
    match raw {
        None => Ok(DEFAULT_POLL_INTERVAL),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(ConfigError::InvalidInterval {
                name: "DISPATCH_POLL_INTERVAL_MS",
                value,
            }),
        },
    }
}
