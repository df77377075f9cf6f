//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which `RecordStore` adapter backs the shared store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// One JSON file per key under `data_dir`.
    File,
    /// Process memory only. Nothing survives a restart.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    /// A tab with no socket attached and no request for this long is closed.
    pub session_idle_timeout: Duration,
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: Level::INFO,
            store_backend: StoreBackend::File,
            data_dir: PathBuf::from("./data"),
            poll_interval: Duration::from_millis(2000),
            session_idle_timeout: Duration::from_secs(600),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // --- Server Settings ---
        let bind_address = match var("BIND_ADDRESS") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?,
            None => defaults.bind_address,
        };

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        // --- Store Settings ---
        let store_backend = match var("STORE_BACKEND").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("file") => StoreBackend::File,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("'{}' is not one of file, memory", other),
                ))
            }
        };

        let data_dir = var("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir);

        // --- Reconciliation Settings ---
        let poll_interval = match var("POLL_INTERVAL_MS") {
            Some(raw) => {
                let millis = raw
                    .parse::<u64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| {
                        ConfigError::InvalidValue(
                            "POLL_INTERVAL_MS".to_string(),
                            format!("'{}' is not a positive number of milliseconds", raw),
                        )
                    })?;
                Duration::from_millis(millis)
            }
            None => defaults.poll_interval,
        };

        let session_idle_timeout = match var("SESSION_IDLE_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| {
                        ConfigError::InvalidValue(
                            "SESSION_IDLE_SECS".to_string(),
                            format!("'{}' is not a positive number of seconds", raw),
                        )
                    })?;
                Duration::from_secs(secs)
            }
            None => defaults.session_idle_timeout,
        };

        Ok(Self {
            bind_address,
            log_level,
            store_backend,
            data_dir,
            poll_interval,
            session_idle_timeout,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.store_backend, StoreBackend::File);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn values_are_read_and_validated() {
        let config = Config::from_lookup(lookup(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("STORE_BACKEND", "Memory"),
            ("POLL_INTERVAL_MS", "500"),
            ("RUST_LOG", "debug"),
            ("SESSION_IDLE_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(30));

        assert!(matches!(
            Config::from_lookup(lookup(&[("POLL_INTERVAL_MS", "0")])),
            Err(ConfigError::InvalidValue(name, _)) if name == "POLL_INTERVAL_MS"
        ));
        assert!(Config::from_lookup(lookup(&[("STORE_BACKEND", "redis")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SESSION_IDLE_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("BIND_ADDRESS", "nowhere")])).is_err());
    }
}
