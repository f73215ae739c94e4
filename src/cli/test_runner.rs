//! Fixture test runner
//!
//! The run is strictly sequential:
//!
//! build → discover → filter → (for each fixture: invoke → classify → report) → summary
//!
//! ## Classification
//!
//! A fixture passes iff the toolchain exits with status 0. Every other outcome,
//! including signal termination and timeouts, is a failure. Failing to *launch*
//! the toolchain is not a verdict at all: it aborts the run with
//! `HarnessError::Launch`, since it points at the environment rather than the
//! program under test.
//!
//! Each fixture is attempted exactly once. A completed run holds exactly one
//! verdict per eligible fixture; a run aborted by a launch failure holds one verdict
//! per fixture classified before the abort and reports no summary.
//!
//! ## Reporting
//!
//! Nothing here writes to the terminal. Progress and summaries go through the
//! `TestReporter` trait in `report.rs`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::HarnessConfig;

use super::interfaces::{BuildStep, ExecutionOutcome, Executor, FixtureDiscovery, HarnessError};
use super::report::TestReporter;
use super::stats::RunStatistics;

/// Pass/fail verdict for one fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVerdict {
    pub file: PathBuf,
    pub passed: bool,
    /// Toolchain exit status; `None` when killed by a signal or timeout
    pub status: Option<i32>,
    pub timed_out: bool,
    /// Captured toolchain output, kept only for failures
    pub output: Option<String>,
}

/// Classify a finished invocation. Exit status 0 passes; anything else fails.
pub fn classify(file: &Path, outcome: &ExecutionOutcome) -> TestVerdict {
    let passed = outcome.success();
    let output = if passed {
        None
    } else {
        Some(outcome.combined_output()).filter(|s| !s.is_empty())
    };

    TestVerdict {
        file: file.to_path_buf(),
        passed,
        status: outcome.status,
        timed_out: outcome.timed_out,
        output,
    }
}

/// Runs single fixtures through the toolchain.
pub struct TestRunner<'a> {
    config: &'a HarnessConfig,
    executor: &'a dyn Executor,
}

impl<'a> TestRunner<'a> {
    pub fn new(config: &'a HarnessConfig, executor: &'a dyn Executor) -> Self {
        Self { config, executor }
    }

    /// Invoke `[toolchain, "run", file]` once and classify the result.
    pub fn run_one(&self, file: &Path) -> Result<TestVerdict, HarnessError> {
        let command = self.config.fixture_command(file);
        let outcome = self.executor.run(&command, true)?;
        let verdict = classify(file, &outcome);
        tracing::debug!(file = %file.display(), passed = verdict.passed, status = ?verdict.status, "fixture classified");
        Ok(verdict)
    }
}

/// Run the whole harness.
///
/// Fatal errors (missing root, failed build, toolchain launch failure) are returned
/// without a summary being reported; the caller decides how to surface them.
#[tracing::instrument(skip_all, fields(root_count = config.roots.len()))]
pub fn run_harness(
    config: &HarnessConfig,
    build: &dyn BuildStep,
    discovery: &dyn FixtureDiscovery,
    executor: &dyn Executor,
    reporter: &mut dyn TestReporter,
) -> Result<RunStatistics, HarnessError> {
    if config.skip_build {
        tracing::info!("build step skipped");
    } else {
        build.build()?;
    }

    let fixtures: Vec<PathBuf> = discovery
        .list_files(&config.roots)?
        .into_iter()
        .filter(|file| config.is_fixture(file))
        .collect();
    let total = fixtures.len();
    reporter.on_collection_complete(total);

    let runner = TestRunner::new(config, executor);
    let mut stats = RunStatistics::new();
    let start = Instant::now();

    for (index, file) in fixtures.iter().enumerate() {
        let verdict = runner.run_one(file)?;
        stats.record(&verdict);
        reporter.on_test_complete(&verdict, index + 1, total);
    }

    stats.finalize(start.elapsed());
    tracing::info!(
        total = stats.total(),
        failed = stats.failure,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "run complete"
    );
    reporter.on_run_complete(&stats);
    Ok(stats)
}
