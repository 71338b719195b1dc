//! Service-check payloads (`POST /svc`)

use serde::{Deserialize, Serialize};

/// Ask an agent to probe one Service URL `count` times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCheckRequest {
    /// URL probed on every iteration, used verbatim
    #[serde(rename = "svcURL")]
    pub target_url: String,
    /// Number of probes to issue
    pub count: usize,
}

impl ServiceCheckRequest {
    /// Create a new service-check request
    pub fn new(target_url: impl Into<String>, count: usize) -> Self {
        Self {
            target_url: target_url.into(),
            count,
        }
    }
}

/// Result of a service check: how many of the issued probes failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCheckResponse {
    /// Hostname of the agent that ran the check
    #[serde(rename = "srcHost")]
    pub source_host: String,
    /// Failed probes, always `<= count`
    #[serde(rename = "errors")]
    pub error_count: usize,
}

impl ServiceCheckResponse {
    /// True when every probe succeeded
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}
