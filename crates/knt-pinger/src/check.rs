//! Check coordinator
//!
//! Validates a parsed check request, expands it into work items, runs them
//! through a fresh worker pool and shapes the response. Every check gets its
//! own pool with the same configured bound.

use std::sync::Arc;
use std::time::Instant;

use knt_model::direct::work_size;
use knt_model::{
    DirectCheckRequestItem, DirectCheckResultItem, ServiceCheckRequest, ServiceCheckResponse,
};

use crate::engine::{
    direct_targets, service_targets, FailureCollector, FailureCounter, Probe, WorkerPool,
};
use crate::error::CheckError;

/// Runs service and direct checks on behalf of this agent
pub struct CheckCoordinator {
    source_host: String,
    pool_bound: usize,
    peer_port: u16,
    probe: Arc<dyn Probe>,
}

impl CheckCoordinator {
    /// Create a coordinator.
    ///
    /// `peer_port` is the port peers are probed on during a direct check.
    pub fn new(
        source_host: impl Into<String>,
        pool_bound: usize,
        peer_port: u16,
        probe: Arc<dyn Probe>,
    ) -> Self {
        Self {
            source_host: source_host.into(),
            pool_bound,
            peer_port,
            probe,
        }
    }

    /// Hostname reported as the source of every probe
    pub fn source_host(&self) -> &str {
        &self.source_host
    }

    /// Probe `target_url` `count` times and count the failures
    pub async fn service_check(
        &self,
        request: &ServiceCheckRequest,
    ) -> Result<ServiceCheckResponse, CheckError> {
        validate_target(&request.target_url)?;

        let started = Instant::now();
        let error_count = WorkerPool::new(self.pool_bound)
            .run(
                service_targets(&request.target_url, request.count),
                Arc::clone(&self.probe),
                FailureCounter::default(),
            )
            .await;

        tracing::info!(
            "Service check of {}: {}/{} probes failed in {:?}",
            request.target_url,
            error_count,
            request.count,
            started.elapsed()
        );

        Ok(ServiceCheckResponse {
            source_host: self.source_host.clone(),
            error_count,
        })
    }

    /// Probe every address of every peer and return the failures.
    ///
    /// The returned failures are in completion order, not request order.
    pub async fn direct_check(
        &self,
        peers: Vec<DirectCheckRequestItem>,
    ) -> Vec<DirectCheckResultItem> {
        let started = Instant::now();
        let total = work_size(&peers);
        let peer_count = peers.len();

        let failures = WorkerPool::new(self.pool_bound)
            .run(
                direct_targets(&self.source_host, peers, self.peer_port),
                Arc::clone(&self.probe),
                FailureCollector::default(),
            )
            .await;

        tracing::info!(
            "Direct check of {} peers: {}/{} probes failed in {:?}",
            peer_count,
            failures.len(),
            total,
            started.elapsed()
        );

        failures
    }
}

fn validate_target(url: &str) -> Result<(), CheckError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| CheckError::InvalidTarget {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CheckError::InvalidTarget {
            url: url.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ProbeOutcome;
    use async_trait::async_trait;

    /// Everything on port 1 is unreachable
    struct PortProbe;

    #[async_trait]
    impl Probe for PortProbe {
        async fn probe(&self, target: &str) -> ProbeOutcome {
            if target.contains(":1/") {
                ProbeOutcome::Unreachable("connection refused".into())
            } else {
                ProbeOutcome::Reachable
            }
        }
    }

    fn coordinator(peer_port: u16) -> CheckCoordinator {
        CheckCoordinator::new("agent-0", 10, peer_port, Arc::new(PortProbe))
    }

    #[tokio::test]
    async fn test_service_check_bounds() {
        let checks = coordinator(8080);

        let ok = checks
            .service_check(&ServiceCheckRequest::new("http://svc:8080/ping", 25))
            .await
            .unwrap();
        assert_eq!(ok.source_host, "agent-0");
        assert_eq!(ok.error_count, 0);

        let down = checks
            .service_check(&ServiceCheckRequest::new("http://svc:1/ping", 25))
            .await
            .unwrap();
        assert_eq!(down.error_count, 25);

        let empty = checks
            .service_check(&ServiceCheckRequest::new("http://svc:1/ping", 0))
            .await
            .unwrap();
        assert_eq!(empty.error_count, 0);
    }

    #[tokio::test]
    async fn test_service_check_rejects_bad_url() {
        let checks = coordinator(8080);
        for url in ["", "svc:8080", "ftp://svc/ping"] {
            let err = checks
                .service_check(&ServiceCheckRequest::new(url, 1))
                .await
                .unwrap_err();
            assert!(matches!(err, CheckError::InvalidTarget { .. }), "{}", url);
        }
    }

    #[tokio::test]
    async fn test_direct_check_uses_peer_port() {
        let peers = vec![DirectCheckRequestItem::new(
            "agent-1",
            vec!["10.0.0.2".into(), "fd00::2".into()],
        )];

        assert!(coordinator(8080).direct_check(peers.clone()).await.is_empty());

        let failures = coordinator(1).direct_check(peers).await;
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|f| f.source_host == "agent-0"));
        assert!(failures.iter().all(|f| f.dest_host == "agent-1"));
    }

    #[tokio::test]
    async fn test_direct_check_empty_request() {
        assert!(coordinator(8080).direct_check(Vec::new()).await.is_empty());
    }
}
