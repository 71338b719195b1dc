//! Core domain types shared with the cluster collaborators

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of cluster resource created for a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// apps/v1 Deployment running the agents
    Deployment,
    /// v1 Service fronting the agents
    Service,
    /// networking.k8s.io/v1 Ingress exposing the agents
    Ingress,
}

impl ResourceKind {
    /// Resource name as understood by the cluster CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Deployment => "deployment",
            ResourceKind::Service => "service",
            ResourceKind::Ingress => "ingress",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named resource document ready to be submitted to the cluster
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Resource kind
    pub kind: ResourceKind,
    /// `metadata.name`
    pub name: String,
    /// Full resource document
    pub document: serde_json::Value,
}

/// Equality-based label selector (`matchLabels`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSelector(pub BTreeMap<String, String>);

impl LabelSelector {
    /// Whether the selector has no terms
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        f.write_str(&terms.join(","))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSelector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A running pod and the addresses assigned to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodAddresses {
    /// Pod name, which is also the agent's hostname
    pub name: String,
    /// Pod IPs (one per address family)
    pub ips: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_display_is_sorted() {
        let selector: LabelSelector = [("tier", "probe"), ("app", "pinger")].into_iter().collect();
        assert_eq!(selector.to_string(), "app=pinger,tier=probe");
    }

    #[test]
    fn test_resource_kind_display() {
        assert_eq!(ResourceKind::Deployment.to_string(), "deployment");
        assert_eq!(format!("{}", ResourceKind::Ingress), "ingress");
    }
}
