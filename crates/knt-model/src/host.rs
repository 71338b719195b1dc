//! Agent identity payload (`GET /ping`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hostname of an agent mapped to its interface addresses.
///
/// Serializes as a single-entry JSON object: `{"pinger-0": ["10.1.0.7"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostAddrs(pub BTreeMap<String, Vec<String>>);

impl HostAddrs {
    /// Create the payload for one host
    pub fn new(hostname: impl Into<String>, addrs: Vec<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(hostname.into(), addrs);
        Self(map)
    }

    /// The host entry, if present
    pub fn entry(&self) -> Option<(&str, &[String])> {
        self.0
            .iter()
            .next()
            .map(|(host, addrs)| (host.as_str(), addrs.as_slice()))
    }
}
