//! Core error types for k8s-net-test

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while talking to the cluster API.
///
/// These are fatal to the orchestrating process; the probe agents never
/// produce them.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// The cluster command could not be started
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The cluster command exited unsuccessfully
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Command output could not be decoded
    #[error("Unexpected output from {command}: {message}")]
    Output { command: String, message: String },

    /// The readiness watch stopped before the deployment became available
    #[error("Watch on deployment {deployment} ended with {available}/{wanted} replicas available")]
    WatchEnded {
        deployment: String,
        available: u32,
        wanted: u32,
    },

    /// The readiness watch did not observe the ready transition in time
    #[error("Deployment {0} did not become available in time")]
    ReadinessTimeout(String),
}
