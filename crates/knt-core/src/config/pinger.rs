//! Probe agent configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_millis;
use crate::error::ConfigError;

/// Default HTTP port of the agent
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of concurrent probes per check
pub const DEFAULT_POOL_BOUND: usize = 1000;

/// Configuration for the probe agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PingerConfig {
    /// Address to bind the HTTP listener to
    pub listen_address: String,

    /// HTTP listen port
    pub port: u16,

    /// Maximum number of probes in flight within one check
    pub pool_bound: usize,

    /// Per-probe timeout.
    ///
    /// Kept short: a probe exists to detect unreachability, not to tolerate
    /// slow paths.
    #[serde(with = "duration_millis")]
    pub probe_timeout: Duration,

    /// Port used when probing peers directly (defaults to `port`)
    pub probe_port: Option<u16>,
}

impl Default for PingerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            pool_bound: DEFAULT_POOL_BOUND,
            probe_timeout: Duration::from_secs(1),
            probe_port: None,
        }
    }
}

impl PingerConfig {
    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        if self.listen_address.contains(':') {
            format!("[{}]:{}", self.listen_address, self.port)
        } else {
            format!("{}:{}", self.listen_address, self.port)
        }
    }

    /// Port peers are probed on during a direct check
    pub fn peer_port(&self) -> u16 {
        self.probe_port.unwrap_or(self.port)
    }

    /// Reject values the agent cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be a positive integer".into()));
        }
        if self.probe_port == Some(0) {
            return Err(ConfigError::Invalid(
                "probe_port must be a positive integer".into(),
            ));
        }
        if self.pool_bound == 0 {
            return Err(ConfigError::Invalid("pool_bound must be at least 1".into()));
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::Invalid("probe_timeout must be non-zero".into()));
        }
        Ok(())
    }
}
