//! Orchestrating client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::{duration_millis, option_duration_millis};
use crate::error::ConfigError;

/// Configuration for the orchestrating client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Path to the kubeconfig file (`KUBECONFIG` overrides this)
    pub kubeconfig: Option<PathBuf>,

    /// kubectl executable used to reach the cluster
    pub kubectl: String,

    /// Manifest holding the agent Deployment, Service and optional Ingress
    pub manifest: PathBuf,

    /// Namespace the agents are deployed into
    pub namespace: String,

    /// Number of agent replicas
    pub replicas: u32,

    /// Base URL the agents are reachable on from outside the cluster
    pub ingress_url: String,

    /// Service probes issued per replica during the service check
    pub probes_per_replica: u32,

    /// Timeout for each check request sent to an agent
    #[serde(with = "duration_millis")]
    pub request_timeout: Duration,

    /// Upper bound on waiting for the agents to become available.
    /// Unset means wait for as long as the watch stays open.
    #[serde(with = "option_duration_millis")]
    pub readiness_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            kubeconfig: dirs::home_dir().map(|home| home.join(".kube").join("config")),
            kubectl: "kubectl".to_string(),
            manifest: PathBuf::from("manifest.yaml"),
            namespace: "default".to_string(),
            replicas: 2,
            ingress_url: "http://localhost:9080".to_string(),
            probes_per_replica: 100,
            request_timeout: Duration::from_secs(5),
            readiness_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Number of probes the service check issues
    pub fn service_probe_count(&self) -> usize {
        self.probes_per_replica as usize * self.replicas as usize
    }

    /// Ingress URL joined with an agent endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.ingress_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replicas == 0 {
            return Err(ConfigError::Invalid("replicas must be at least 1".into()));
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }
        if self.ingress_url.is_empty() {
            return Err(ConfigError::Invalid("ingress_url must not be empty".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout must be non-zero".into()));
        }
        Ok(())
    }
}
