//! Configuration management for k8s-net-test

mod client;
mod pinger;
pub mod serde_utils;

pub use client::ClientConfig;
pub use pinger::{PingerConfig, DEFAULT_POOL_BOUND, DEFAULT_PORT};

use crate::error::ConfigError;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    tracing::debug!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Load configuration if `path` is given, otherwise use defaults
pub fn load_or_default<T>(path: Option<&Path>) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match path {
        Some(path) => load_config(path),
        None => Ok(T::default()),
    }
}
