//! Direct (pod-to-pod) check payloads (`POST /direct`)
//!
//! A request is a sequence of [`DirectCheckRequestItem`]; the response is a
//! sequence of [`DirectCheckResultItem`] holding failures only. An empty
//! response means every address of every peer was reachable.
//!
//! The order of result items follows the order in which probes failed on the
//! agent, not the order of the request.

use serde::{Deserialize, Serialize};

/// One peer agent and the addresses it should be reached on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectCheckRequestItem {
    /// Peer hostname (pod name)
    pub hostname: String,
    /// Peer addresses, IPv4 or IPv6 literals or resolvable names
    pub addrs: Vec<String>,
}

impl DirectCheckRequestItem {
    /// Create a new request item
    pub fn new(hostname: impl Into<String>, addrs: Vec<String>) -> Self {
        Self {
            hostname: hostname.into(),
            addrs,
        }
    }
}

/// A failed probe from one agent to one peer address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectCheckResultItem {
    /// Agent that issued the probe
    #[serde(rename = "srcHost")]
    pub source_host: String,
    /// Peer the probe targeted
    #[serde(rename = "dstHost")]
    pub dest_host: String,
    /// Peer address the probe targeted
    pub addr: String,
    /// Failure description, empty while the probe has not failed
    pub error: String,
}

impl DirectCheckResultItem {
    /// Whether this item records a failure
    pub fn is_failure(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Total number of probes a direct request expands to
pub fn work_size(items: &[DirectCheckRequestItem]) -> usize {
    items.iter().map(|item| item.addrs.len()).sum()
}
