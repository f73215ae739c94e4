//! Run statistics
//!
//! One owned `RunStatistics` value is threaded through the run and updated as each
//! verdict arrives.

use std::time::Duration;

use super::test_runner::TestVerdict;

/// Running pass/fail totals and the elapsed wall-clock time of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub success: usize,
    pub failure: usize,
    /// Zero until `finalize` is called
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one verdict.
    pub fn record(&mut self, verdict: &TestVerdict) {
        if verdict.passed {
            self.success += 1;
        } else {
            self.failure += 1;
        }
    }

    /// Stamp the run's elapsed duration.
    pub fn finalize(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Number of verdicts recorded so far.
    pub fn total(&self) -> usize {
        self.success + self.failure
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn all_passed(&self) -> bool {
        self.failure == 0
    }
}
