//! Agent state management

use std::sync::Arc;

use knt_core::config::PingerConfig;

use crate::check::CheckCoordinator;
use crate::engine::{HttpProbe, Probe};
use crate::host::HostInfo;

/// Shared, read-only state of the agent
pub struct PingerState {
    /// Configuration
    pub config: PingerConfig,
    /// This agent's identity
    pub host: HostInfo,
    /// Check coordinator
    pub checks: CheckCoordinator,
}

impl PingerState {
    /// Create agent state probing over HTTP
    pub fn new(config: PingerConfig, host: HostInfo) -> Result<Self, reqwest::Error> {
        let probe = Arc::new(HttpProbe::new(config.probe_timeout)?);
        Ok(Self::with_probe(config, host, probe))
    }

    /// Create agent state with a custom probe client
    pub fn with_probe(config: PingerConfig, host: HostInfo, probe: Arc<dyn Probe>) -> Self {
        let checks = CheckCoordinator::new(
            host.hostname(),
            config.pool_bound,
            config.peer_port(),
            probe,
        );
        Self {
            config,
            host,
            checks,
        }
    }
}
