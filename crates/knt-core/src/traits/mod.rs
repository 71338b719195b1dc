//! Core trait definitions

mod cluster;

pub use cluster::{ClusterClient, ReadinessWatcher};
