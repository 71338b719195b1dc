//! Bounded-concurrency probing engine
//!
//! A check is expanded into work items ([`item`]), drained through a fixed
//! number of workers ([`pool`]) that each call the [`probe`] client, and the
//! per-item outputs are folded into the check response ([`aggregate`]).

pub mod aggregate;
pub mod item;
pub mod pool;
pub mod probe;

pub use aggregate::{Aggregator, FailureCollector, FailureCounter};
pub use item::{direct_targets, probe_url, service_targets, DirectTarget, ServiceTarget, WorkItem};
pub use pool::WorkerPool;
pub use probe::{HttpProbe, Probe, ProbeOutcome};
