#![forbid(unsafe_code)]
//! Lily fixture harness
//!
//! Builds the Lily toolchain, discovers `.lily` fixture programs, runs each one
//! through `lily run <file>`, and reports pass/fail counts with timing. A fixture
//! passes iff the toolchain exits with status 0.
//!
//! A completed run reports exactly one verdict per eligible fixture, and the
//! summary counts add up to the number of fixtures found. A toolchain that cannot
//! be launched stops the run instead: fixtures already classified keep their
//! verdicts, the rest are never attempted, no summary is printed and the harness
//! exits with status 2.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod version;

pub use cli::interfaces::{
    BuildStep, CommandBuildStep, ExecutionOutcome, Executor, FixtureDiscovery, HarnessError, ProcessExecutor,
    WalkDirDiscovery,
};
pub use cli::report::{ConsoleReporter, JsonReporter, Message, TestReporter};
pub use cli::stats::RunStatistics;
pub use cli::test_runner::{TestRunner, TestVerdict, classify, run_harness};
pub use config::{ColorChoice, HarnessConfig, OutputFormat};
