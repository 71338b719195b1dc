//! knt-pinger: Probe agent for k8s-net-test
//!
//! The agent runs as a pod in the cluster under test. On request it fans out
//! many independent HTTP probes, either against one Service address or
//! against every address of every peer agent, through a fixed-size worker
//! pool, and reports which probes failed.

pub mod check;
pub mod engine;
pub mod error;
pub mod host;
pub mod server;
pub mod state;

pub use check::CheckCoordinator;
pub use error::{CheckError, HostError};
pub use host::HostInfo;
pub use state::PingerState;
