//! Agent identity: hostname and interface addresses
//!
//! Computed once at startup and shared read-only for the lifetime of the
//! process, so `/ping` always returns the same body.

use std::net::IpAddr;

use axum::body::Bytes;
use knt_model::HostAddrs;

use crate::error::HostError;

/// Hostname and reachable addresses of this agent
#[derive(Debug, Clone)]
pub struct HostInfo {
    hostname: String,
    addrs: Vec<String>,
    ping_body: Bytes,
}

impl HostInfo {
    /// Build host info from known values
    pub fn new(hostname: impl Into<String>, addrs: Vec<String>) -> Result<Self, HostError> {
        let hostname = hostname.into();
        let ping_body = serde_json::to_vec(&HostAddrs::new(hostname.clone(), addrs.clone()))?;
        Ok(Self {
            hostname,
            addrs,
            ping_body: Bytes::from(ping_body),
        })
    }

    /// Discover the hostname and the non-loopback, non-link-local addresses
    pub fn discover() -> Result<Self, HostError> {
        let hostname = gethostname::gethostname()
            .into_string()
            .map_err(HostError::Hostname)?;

        let addrs: Vec<String> = if_addrs::get_if_addrs()?
            .into_iter()
            .map(|iface| iface.ip())
            .filter(is_reported)
            .map(|ip| ip.to_string())
            .collect();

        tracing::info!("Host {} has addresses {:?}", hostname, addrs);
        Self::new(hostname, addrs)
    }

    /// This agent's hostname
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// This agent's reported addresses
    pub fn addrs(&self) -> &[String] {
        &self.addrs
    }

    /// Pre-serialized `/ping` body
    pub fn ping_body(&self) -> Bytes {
        self.ping_body.clone()
    }
}

/// Whether an interface address is reported to peers
pub fn is_reported(ip: &IpAddr) -> bool {
    if ip.is_loopback() {
        return false;
    }
    match ip {
        IpAddr::V4(v4) => !v4.is_link_local(),
        // fe80::/10
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) != 0xfe80,
    }
}
