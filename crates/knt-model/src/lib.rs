//! knt-model: Wire payloads for k8s-net-test
//!
//! This crate defines the JSON bodies exchanged between the orchestrating
//! client and the probe agents (`pinger`) deployed in the cluster.

pub mod direct;
pub mod host;
pub mod service;

pub use direct::{DirectCheckRequestItem, DirectCheckResultItem};
pub use host::HostAddrs;
pub use service::{ServiceCheckRequest, ServiceCheckResponse};
