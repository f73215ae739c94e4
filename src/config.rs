//! Harness configuration
//!
//! Defaults reproduce the layout of a Lily checkout: the toolchain is built with
//! `make` into `_build/default/src/lily.exe` and fixtures live under `tests/programs`.

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source file extension recognized by the toolchain (without the leading dot).
pub const DEFAULT_EXTENSION: &str = "lily";

/// Toolchain binary produced by the build step.
pub const DEFAULT_TOOLCHAIN: &str = "./_build/default/src/lily.exe";

/// Toolchain subcommand that executes a program file.
pub const RUN_SUBCOMMAND: &str = "run";

/// Fixture root scanned when none is given.
pub const DEFAULT_ROOT: &str = "tests/programs";

/// When to emit ANSI styling on console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Style output only when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Resolve the choice against the current stdout.
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => std::io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress lines followed by a summary
    #[default]
    Human,
    /// One JSON object per event
    Json,
}

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Toolchain executable invoked for every fixture
    pub toolchain: PathBuf,
    /// Fixture extension, without the leading dot
    pub extension: String,
    /// Directories scanned recursively for fixtures, in order
    pub roots: Vec<PathBuf>,
    /// Build action run before any fixture (program followed by its arguments)
    pub build_command: Vec<OsString>,
    /// Skip the build action entirely
    pub skip_build: bool,
    /// Per-fixture wall-clock limit
    pub timeout: Option<Duration>,
    pub color: ColorChoice,
    pub format: OutputFormat,
    /// Print captured output of failing fixtures
    pub verbose: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            toolchain: PathBuf::from(DEFAULT_TOOLCHAIN),
            extension: DEFAULT_EXTENSION.to_string(),
            roots: vec![PathBuf::from(DEFAULT_ROOT)],
            build_command: vec![OsString::from("make")],
            skip_build: false,
            timeout: None,
            color: ColorChoice::default(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the toolchain executable
    pub fn with_toolchain(mut self, toolchain: impl Into<PathBuf>) -> Self {
        self.toolchain = toolchain.into();
        self
    }

    /// Set the recognized fixture extension; a leading dot is ignored
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.strip_prefix('.').unwrap_or(&extension).to_string();
        self
    }

    /// Replace the fixture roots
    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
        self
    }

    /// Set the build command from a whitespace-separated string
    pub fn with_build_command(mut self, command: &str) -> Self {
        self.build_command = command.split_whitespace().map(OsString::from).collect();
        self
    }

    /// Skip or run the build step
    pub fn with_skip_build(mut self, skip: bool) -> Self {
        self.skip_build = skip;
        self
    }

    /// Bound each toolchain invocation
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// A file is an eligible fixture iff its extension equals the configured one.
    pub fn is_fixture(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.extension.as_str())
    }

    /// Argv used to run one fixture: `[toolchain, "run", file]`.
    pub fn fixture_command(&self, file: &Path) -> Vec<OsString> {
        vec![
            self.toolchain.clone().into_os_string(),
            OsString::from(RUN_SUBCOMMAND),
            file.as_os_str().to_os_string(),
        ]
    }
}
