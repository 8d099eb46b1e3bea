//! Configuration management for the to-do application.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ConfigError;
use crate::remote::DEFAULT_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Local persistence configuration
    pub storage: StorageConfig,
    /// Remote to-do source configuration
    pub remote: RemoteConfig,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Local persistence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one file per persisted key
    pub data_dir: PathBuf,
}

/// Remote to-do source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// URL returning a JSON array of remote records
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Keep at most this many records per fetch
    pub limit: Option<usize>,
}

impl RemoteConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: 10,
            limit: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./.checkmark"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            remote: RemoteConfig::default(),
            shutdown_timeout: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset and empty variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse
    /// or the remote timeout is zero.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            storage: StorageConfig {
                data_dir: var("TODO_DATA_DIR")
                    .map_or(defaults.storage.data_dir, PathBuf::from),
            },
            remote: RemoteConfig {
                endpoint: var("TODO_REMOTE_URL").unwrap_or(defaults.remote.endpoint),
                timeout: parse_timeout(var("TODO_REMOTE_TIMEOUT_SECS"))?
                    .unwrap_or(defaults.remote.timeout),
                limit: parse_var("TODO_REMOTE_LIMIT", var("TODO_REMOTE_LIMIT"))?,
            },
            shutdown_timeout: parse_var(
                "TODO_SHUTDOWN_TIMEOUT_SECS",
                var("TODO_SHUTDOWN_TIMEOUT_SECS"),
            )?
            .unwrap_or(defaults.shutdown_timeout),
        })
    }

    /// Graceful shutdown timeout as a `Duration`
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

fn parse_var<T>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value: raw,
            })
        })
        .transpose()
}

fn parse_timeout(value: Option<String>) -> Result<Option<u64>, ConfigError> {
    const NAME: &str = "TODO_REMOTE_TIMEOUT_SECS";

    match parse_var::<u64>(NAME, value.clone())? {
        Some(0) => Err(ConfigError::Invalid {
            name: NAME,
            reason: "timeout must be at least one second".to_string(),
            value: value.unwrap_or_default(),
        }),
        timeout => Ok(timeout),
    }
}
