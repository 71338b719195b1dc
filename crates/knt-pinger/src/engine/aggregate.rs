//! Result aggregation policies
//!
//! An aggregator is fed by a single reader of the results channel, so it
//! needs no synchronization of its own.

use knt_model::DirectCheckResultItem;

use super::probe::ProbeOutcome;

/// Folds worker outputs into a check result
pub trait Aggregator<T> {
    /// Final value once the results channel has closed
    type Output;

    /// Fold one worker output
    fn accept(&mut self, result: T);

    /// Produce the final value
    fn finish(self) -> Self::Output;
}

/// Counts failed probes; successes are dropped
#[derive(Debug, Default)]
pub struct FailureCounter {
    failures: usize,
}

impl Aggregator<ProbeOutcome> for FailureCounter {
    type Output = usize;

    fn accept(&mut self, result: ProbeOutcome) {
        if result.is_failure() {
            self.failures += 1;
        }
    }

    fn finish(self) -> usize {
        self.failures
    }
}

/// Keeps failed direct probes in arrival order.
///
/// Arrival order depends on worker scheduling and probe latency; it is not
/// the request order.
#[derive(Debug, Default)]
pub struct FailureCollector {
    failures: Vec<DirectCheckResultItem>,
}

impl Aggregator<DirectCheckResultItem> for FailureCollector {
    type Output = Vec<DirectCheckResultItem>;

    fn accept(&mut self, result: DirectCheckResultItem) {
        if result.is_failure() {
            self.failures.push(result);
        }
    }

    fn finish(self) -> Vec<DirectCheckResultItem> {
        self.failures
    }
}
