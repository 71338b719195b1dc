//! knt-core: Core abstractions and configuration for k8s-net-test
//!
//! This crate provides shared types, traits, and configuration structures
//! used by the probe agent and the orchestrating client.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{ClusterError, ConfigError};
pub use types::{LabelSelector, PodAddresses, Resource, ResourceKind};
