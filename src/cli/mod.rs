//! CLI module for the Lily fixture harness
//!
//! ## Modules
//!
//! - `interfaces` - Process execution, fixture discovery and build step boundaries
//! - `test_runner` - Fixture classification and run orchestration
//! - `stats` - Pass/fail accounting
//! - `report` - Console and JSON reporters
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.
//!
//! ## Exit codes
//!
//! - `0` - every fixture passed (or none were found)
//! - `1` - at least one fixture failed
//! - `2` - fatal error: missing fixture root, failed build, or toolchain launch failure

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod interfaces;
pub mod report;
pub mod stats;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use crate::config::{ColorChoice, DEFAULT_EXTENSION, DEFAULT_TOOLCHAIN, HarnessConfig, OutputFormat};
use crate::version::HARNESS_VERSION;

use interfaces::{CommandBuildStep, ProcessExecutor, WalkDirDiscovery};
use report::{ConsoleReporter, JsonReporter, TestReporter};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    pub const FATAL: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a fatal error (exit code 2).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FATAL)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Build the Lily toolchain and run every fixture program through it
#[derive(Parser, Debug)]
#[command(name = "lily-harness")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Build the Lily toolchain and run every fixture program through it", long_about = None)]
pub struct Cli {
    /// Fixture directories, scanned recursively (default: tests/programs)
    #[arg(value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Toolchain executable invoked as `<TOOLCHAIN> run <FILE>`
    #[arg(long, value_name = "PATH", default_value = DEFAULT_TOOLCHAIN)]
    pub toolchain: PathBuf,

    /// Fixture file extension
    #[arg(long = "ext", value_name = "EXT", default_value = DEFAULT_EXTENSION, value_parser = parse_extension)]
    pub extension: String,

    /// Build command run before any fixture
    #[arg(long = "build-cmd", value_name = "CMD", default_value = "make", conflicts_with = "no_build")]
    pub build_command: String,

    /// Skip the build step
    #[arg(long = "no-build")]
    pub no_build: bool,

    /// Kill a fixture's toolchain run after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// When to color ok/failed
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Print captured toolchain output for failing fixtures
    #[arg(short, long)]
    pub verbose: bool,
}

/// Accept `lily` or `.lily`; an empty extension would match files like `a.`.
fn parse_extension(raw: &str) -> Result<String, String> {
    let ext = raw.strip_prefix('.').unwrap_or(raw);
    if ext.is_empty() {
        Err("extension must not be empty".to_string())
    } else {
        Ok(ext.to_string())
    }
}

impl Cli {
    /// Turn parsed arguments into a harness configuration.
    pub fn into_config(self) -> HarnessConfig {
        let mut config = HarnessConfig::new()
            .with_toolchain(self.toolchain)
            .with_extension(self.extension)
            .with_build_command(&self.build_command)
            .with_skip_build(self.no_build)
            .with_timeout(self.timeout.map(Duration::from_secs))
            .with_color(self.color)
            .with_format(self.format)
            .with_verbose(self.verbose);
        if !self.roots.is_empty() {
            config = config.with_roots(self.roots);
        }
        config
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.into_config();
    tracing::debug!(?config, "harness configuration");

    if !config.skip_build && config.build_command.is_empty() {
        return Err(CliError::fatal("error: --build-cmd must name a command (use --no-build to skip the build)"));
    }

    match config.format {
        OutputFormat::Human => {
            let mut reporter = ConsoleReporter::stdio(config.color.enabled(), config.verbose);
            run_fixtures(&config, &mut reporter)
        }
        OutputFormat::Json => run_fixtures(&config, &mut JsonReporter::new(std::io::stdout())),
    }
}

/// Run the harness with the default process and filesystem implementations.
pub fn run_fixtures(config: &HarnessConfig, reporter: &mut dyn TestReporter) -> CliResult<ExitCode> {
    let executor = ProcessExecutor::new().with_timeout(config.timeout);
    let build = CommandBuildStep::new(config.build_command.clone());

    match test_runner::run_harness(config, &build, &WalkDirDiscovery, &executor, reporter) {
        Ok(stats) if stats.all_passed() => Ok(ExitCode::SUCCESS),
        // Failures already shown in the summary
        Ok(_) => Ok(ExitCode::FAILURE),
        Err(e) => {
            // Reported in the selected format; nothing left for `run()` to print
            reporter.on_fatal(&e);
            Err(CliError::fatal(""))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
