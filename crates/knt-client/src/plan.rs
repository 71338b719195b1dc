//! Check payload planning
//!
//! Turns the manifest and the running agent pods into the two check
//! requests sent to the agents.

use knt_core::PodAddresses;
use knt_model::{DirectCheckRequestItem, ServiceCheckRequest};

use crate::manifest::Manifest;

/// Requests for one test run
#[derive(Debug, Clone, PartialEq)]
pub struct CheckPlan {
    /// Service check payload for `POST /svc`
    pub service: ServiceCheckRequest,
    /// Direct check payload for `POST /direct`
    pub direct: Vec<DirectCheckRequestItem>,
}

impl CheckPlan {
    /// Plan the checks for the pods backing `manifest`.
    ///
    /// `service_probes` is the number of probes the service check issues.
    pub fn new(manifest: &Manifest, pods: Vec<PodAddresses>, service_probes: usize) -> Self {
        let service_url = service_url(&manifest.service().name, manifest.service_port());
        Self {
            service: ServiceCheckRequest::new(service_url, service_probes),
            direct: direct_payload(pods),
        }
    }
}

/// In-cluster URL of the agents' `/ping` behind the Service
pub fn service_url(service: &str, port: u16) -> String {
    format!("http://{}:{}/ping", service, port)
}

/// One direct check item per pod
pub fn direct_payload(pods: Vec<PodAddresses>) -> Vec<DirectCheckRequestItem> {
    pods.into_iter()
        .map(|pod| {
            if pod.ips.is_empty() {
                tracing::warn!("Pod {} has no IP assigned yet", pod.name);
            }
            DirectCheckRequestItem::new(pod.name, pod.ips)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "
kind: Deployment
metadata: {name: pinger}
spec:
  selector:
    matchLabels: {app: pinger}
---
kind: Service
metadata: {name: pinger-svc}
spec:
  ports:
    - port: 8080
";

    fn pod(name: &str, ips: &[&str]) -> PodAddresses {
        PodAddresses {
            name: name.into(),
            ips: ips.iter().map(|ip| ip.to_string()).collect(),
        }
    }

    #[test]
    fn test_plan() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let pods = vec![
            pod("pinger-a", &["10.244.0.5", "fd00::5"]),
            pod("pinger-b", &["10.244.1.6"]),
        ];

        let plan = CheckPlan::new(&manifest, pods, 200);
        assert_eq!(plan.service.target_url, "http://pinger-svc:8080/ping");
        assert_eq!(plan.service.count, 200);
        assert_eq!(
            plan.direct,
            vec![
                DirectCheckRequestItem::new("pinger-a", vec!["10.244.0.5".into(), "fd00::5".into()]),
                DirectCheckRequestItem::new("pinger-b", vec!["10.244.1.6".into()]),
            ]
        );
    }

    #[test]
    fn test_pod_without_ips_is_kept() {
        let direct = direct_payload(vec![pod("pending", &[])]);
        assert_eq!(direct.len(), 1);
        assert!(direct[0].addrs.is_empty());
    }
}
