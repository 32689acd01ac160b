//! Configuration module
//!
//! Loads configuration from an optional env-file (given by `--config`) and
//! the process environment, with the environment taking precedence.
//! Extended from the teacher's `Config::from_env` (plain `std::env::var`
//! reads) with `dotenvy::from_path` for the `--config` flag and the
//! underscore-delimited key groups spec §6 names
//! (`HTTP_ADDRESS`/`DB_EVENTSTORE_*`/`DB_POSTGRES_*`/`DB_REDIS_*`).

use std::env;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_address: String,
    pub eventstore_url: String,
    pub postgres_url: String,
    pub postgres_max_connections: u32,
    pub redis_url: String,
}

impl Config {
    /// Loads from `config_path` if given (an env-file, `dotenvy` format),
    /// then overlays the process environment. Environment variables always
    /// win over the file, matching the teacher's "env wins" convention for
    /// `dotenvy::dotenv()` in `main.rs`.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            dotenvy::from_path(path).map_err(|e| ConfigError::FileLoad(path.display().to_string(), e.to_string()))?;
        }

        let http_address = env::var("HTTP_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let eventstore_url =
            env::var("DB_EVENTSTORE_URL").map_err(|_| ConfigError::MissingEnv("DB_EVENTSTORE_URL"))?;

        let postgres_url =
            env::var("DB_POSTGRES_URL").map_err(|_| ConfigError::MissingEnv("DB_POSTGRES_URL"))?;

        let postgres_max_connections = env::var("DB_POSTGRES_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DB_POSTGRES_MAX_CONNECTIONS"))?;

        let redis_url = env::var("DB_REDIS_URL").map_err(|_| ConfigError::MissingEnv("DB_REDIS_URL"))?;

        Ok(Self {
            http_address,
            eventstore_url,
            postgres_url,
            postgres_max_connections,
            redis_url,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("failed to load config file {0}: {1}")]
    FileLoad(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_var_is_reported() {
        // SAFETY: test-local env mutation, no other test in this process
        // reads these specific keys concurrently.
        env::remove_var("DB_EVENTSTORE_URL");
        env::remove_var("DB_POSTGRES_URL");
        env::remove_var("DB_REDIS_URL");

        let result = Config::load(None);
        assert!(matches!(result, Err(ConfigError::MissingEnv("DB_EVENTSTORE_URL"))));
    }
}
