//! Cluster collaborator traits
//!
//! The orchestrating client only needs a handful of cluster operations:
//! create and delete the test resources, list the agent pods, and block
//! until the agent deployment is available.

use async_trait::async_trait;

use crate::error::ClusterError;
use crate::types::{LabelSelector, PodAddresses, Resource, ResourceKind};

/// Create/delete access to deployment, service and ingress resources
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Create a resource in the configured namespace
    async fn create(&self, resource: &Resource) -> Result<(), ClusterError>;

    /// Delete a resource by kind and name
    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<(), ClusterError>;

    /// List pods matching a selector together with their IPs
    async fn list_pods(&self, selector: &LabelSelector) -> Result<Vec<PodAddresses>, ClusterError>;
}

/// Blocks until a deployment reports the wanted number of available replicas.
///
/// A single transition: there is no retry once the underlying watch ends.
#[async_trait]
pub trait ReadinessWatcher: Send + Sync {
    /// Wait for `replicas` available replicas of `deployment`
    async fn wait_available(&self, deployment: &str, replicas: u32) -> Result<(), ClusterError>;
}
