//! Work distributor: bounded queue drained by a fixed worker pool
//!
//! One producer enumerates every work item into a queue bounded by the pool
//! size, so a huge check never materializes all of its items at once. Exactly
//! `bound` workers drain the queue until it is closed and empty, probing one
//! item at a time and sending each output to the results channel. The results
//! channel closes only after all workers have been joined, and that closure
//! is the aggregator's end-of-input signal.
//!
//! There is no outer deadline: a check takes as long as its slowest probes,
//! each of which is bounded by the probe client's own timeout.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::aggregate::Aggregator;
use super::item::WorkItem;
use super::probe::{Probe, ProbeOutcome};

/// A fixed-size pool of probe workers, instantiated per check
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    bound: usize,
}

impl WorkerPool {
    /// Create a pool running `bound` workers (at least one)
    pub fn new(bound: usize) -> Self {
        Self {
            bound: bound.max(1),
        }
    }

    /// Maximum number of probes in flight
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Drain `items` through the pool and fold the outputs with `aggregator`.
    ///
    /// The pool size does not depend on the number of items: an empty input
    /// still starts (and immediately stops) `bound` workers.
    pub async fn run<I, A>(&self, items: I, probe: Arc<dyn Probe>, mut aggregator: A) -> A::Output
    where
        I: IntoIterator + Send,
        I::IntoIter: Send,
        I::Item: WorkItem,
        A: Aggregator<<I::Item as WorkItem>::Output> + Send,
    {
        let (work_tx, work_rx) = async_channel::bounded::<I::Item>(self.bound);
        let (result_tx, mut result_rx) = mpsc::channel(self.bound);

        let mut workers = JoinSet::new();
        for _ in 0..self.bound {
            workers.spawn(worker(
                work_rx.clone(),
                result_tx.clone(),
                Arc::clone(&probe),
            ));
        }
        drop(work_rx);

        let produce = async move {
            for item in items {
                if work_tx.send(item).await.is_err() {
                    tracing::warn!("All probe workers exited before the queue was drained");
                    break;
                }
            }
            // work_tx dropped here: the queue is closed
        };

        let barrier = async move {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Probe worker failed: {}", e);
                }
            }
            drop(result_tx);
        };

        let collect = async {
            while let Some(output) = result_rx.recv().await {
                aggregator.accept(output);
            }
        };

        tokio::join!(produce, barrier, collect);
        aggregator.finish()
    }
}

async fn worker<T: WorkItem>(
    queue: async_channel::Receiver<T>,
    results: mpsc::Sender<T::Output>,
    probe: Arc<dyn Probe>,
) {
    while let Ok(item) = queue.recv().await {
        let outcome = {
            let target = item.target();
            let outcome = probe.probe(&target).await;
            if let ProbeOutcome::Unreachable(reason) = &outcome {
                tracing::debug!("Probe failed: {}", reason);
            }
            outcome
        };

        if results.send(item.complete(outcome)).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate::{FailureCollector, FailureCounter};
    use crate::engine::item::{direct_targets, service_targets};
    use async_trait::async_trait;
    use knt_model::DirectCheckRequestItem;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fails any target containing "bad", tracks concurrency
    #[derive(Default)]
    struct InstrumentedProbe {
        calls: AtomicUsize,
        completed: AtomicUsize,
        active: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl InstrumentedProbe {
        fn with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl Probe for InstrumentedProbe {
        async fn probe(&self, target: &str) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.active.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);
            if target.contains("bad") {
                ProbeOutcome::Unreachable(format!("{} is bad", target))
            } else {
                ProbeOutcome::Reachable
            }
        }
    }

    #[tokio::test]
    async fn test_zero_items_completes_empty() {
        let probe = InstrumentedProbe::with_delay(Duration::ZERO);
        let pool = WorkerPool::new(16);

        let failures = pool
            .run(service_targets("http://bad", 0), probe.clone(), FailureCounter::default())
            .await;
        assert_eq!(failures, 0);

        let items = pool
            .run(direct_targets("me", vec![], 8080), probe.clone(), FailureCollector::default())
            .await;
        assert!(items.is_empty());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_service_counts_every_failure() {
        let probe = InstrumentedProbe::with_delay(Duration::ZERO);
        let pool = WorkerPool::new(4);

        let failures = pool
            .run(service_targets("http://bad:1/ping", 50), probe.clone(), FailureCounter::default())
            .await;
        assert_eq!(failures, 50);

        let failures = pool
            .run(service_targets("http://good:1/ping", 50), probe.clone(), FailureCounter::default())
            .await;
        assert_eq!(failures, 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn test_peak_concurrency_never_exceeds_bound() {
        let probe = InstrumentedProbe::with_delay(Duration::from_millis(2));
        let pool = WorkerPool::new(8);

        let failures = pool
            .run(service_targets("http://svc/ping", 400), probe.clone(), FailureCounter::default())
            .await;

        assert_eq!(failures, 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 400);
        let peak = probe.peak.load(Ordering::SeqCst);
        assert!(peak <= 8, "peak concurrency {} exceeded bound", peak);
        assert!(peak > 1, "probes never overlapped");
    }

    #[tokio::test]
    async fn test_producer_stays_within_queue_bound() {
        let probe = InstrumentedProbe::with_delay(Duration::from_millis(5));
        let pool = WorkerPool::new(2);
        let pulled = Arc::new(AtomicUsize::new(0));
        let max_lead = Arc::new(AtomicUsize::new(0));

        let items = {
            let probe = Arc::clone(&probe);
            let pulled = Arc::clone(&pulled);
            let max_lead = Arc::clone(&max_lead);
            service_targets("http://svc/ping", 40).inspect(move |_| {
                let pulled = pulled.fetch_add(1, Ordering::SeqCst) + 1;
                let lead = pulled - probe.completed.load(Ordering::SeqCst);
                max_lead.fetch_max(lead, Ordering::SeqCst);
            })
        };

        let failures = pool.run(items, probe.clone(), FailureCounter::default()).await;

        assert_eq!(failures, 0);
        assert_eq!(pulled.load(Ordering::SeqCst), 40);
        // queued + in flight + the item blocked in send
        let lead = max_lead.load(Ordering::SeqCst);
        assert!(lead <= 2 * pool.bound() + 1, "producer ran {} items ahead", lead);
    }

    #[tokio::test]
    async fn test_bound_larger_than_work() {
        let probe = InstrumentedProbe::with_delay(Duration::from_millis(2));
        let pool = WorkerPool::new(1000);

        let failures = pool
            .run(service_targets("http://svc/ping", 3), probe.clone(), FailureCounter::default())
            .await;

        assert_eq!(failures, 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_direct_collects_failed_addresses() {
        let probe = InstrumentedProbe::with_delay(Duration::ZERO);
        let pool = WorkerPool::new(2);
        let peers = vec![
            DirectCheckRequestItem::new("h1", vec!["10.0.0.1".into(), "bad-a".into()]),
            DirectCheckRequestItem::new("h2", vec!["bad-b".into(), "fd00::2".into()]),
        ];

        let mut failures = pool
            .run(direct_targets("me", peers, 8080), probe, FailureCollector::default())
            .await;
        failures.sort_by(|a, b| a.addr.cmp(&b.addr));

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].addr, "bad-a");
        assert_eq!(failures[0].dest_host, "h1");
        assert_eq!(failures[1].addr, "bad-b");
        assert_eq!(failures[1].dest_host, "h2");
        assert!(failures.iter().all(|f| f.source_host == "me"));
    }

    #[test]
    fn test_bound_is_at_least_one() {
        assert_eq!(WorkerPool::new(0).bound(), 1);
        assert_eq!(WorkerPool::new(1000).bound(), 1000);
    }
}
