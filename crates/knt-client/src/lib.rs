//! knt-client: Orchestrating client for k8s-net-test
//!
//! Deploys the probe agents described by a manifest, waits for them to
//! become available, asks them to run the service and direct checks, and
//! tears everything down again.

pub mod checker;
pub mod error;
pub mod kubectl;
pub mod manifest;
pub mod output;
pub mod plan;
pub mod run;

pub use checker::{Checker, CheckerError};
pub use error::ManifestError;
pub use kubectl::Kubectl;
pub use manifest::Manifest;
pub use plan::CheckPlan;
pub use run::{RunReport, TestRun};
