//! Harness I/O boundary interfaces
//!
//! This module defines trait-based abstractions for the operations that touch
//! the outside world:
//! - Process execution (toolchain and build invocations)
//! - Fixture discovery (filesystem scan)
//! - The build step that runs before any fixture
//!
//! The orchestrator in `test_runner` only talks to these traits, so its logic can
//! be exercised with in-memory fakes. Default implementations spawn real processes
//! and walk the real filesystem.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use walkdir::WalkDir;

/// Interval between liveness checks while a bounded invocation is running.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long captured output is still awaited once a bounded invocation has ended.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Errors that stop the whole run.
///
/// A fixture exiting non-zero is *not* an error; it becomes a failed verdict.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("the directory doesn't exist: `{}`", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("build step `{command}` failed ({})", describe_status(.status.as_ref().copied()))]
    BuildFailed { command: String, status: Option<i32> },

    #[error("cannot run an empty command")]
    EmptyCommand,
}

/// Human-readable form of an exit status.
pub fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn join_command(command: &[OsString]) -> String {
    command
        .iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Executor Interface
// ============================================================================

/// Result of one finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Exit code; `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// The process was killed after exceeding the configured timeout
    pub timed_out: bool,
}

impl ExecutionOutcome {
    /// Outcome with an exit code and no captured output.
    pub fn exited(code: i32) -> Self {
        Self {
            status: Some(code),
            ..Self::default()
        }
    }

    fn from_output(output: Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
            timed_out: false,
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        Self {
            status: status.code(),
            ..Self::default()
        }
    }

    /// True iff the process exited normally with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0) && !self.timed_out
    }

    /// Captured stderr followed by stdout, lossily decoded.
    pub fn combined_output(&self) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr);
        let stdout = String::from_utf8_lossy(&self.stdout);
        match (stderr.trim().is_empty(), stdout.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => stderr.trim_end().to_string(),
            (true, false) => stdout.trim_end().to_string(),
            (false, false) => format!("{}\n{}", stderr.trim_end(), stdout.trim_end()),
        }
    }
}

/// Run an external process to completion.
///
/// `command` is argv-style: the executable followed by its arguments. A non-zero
/// exit is a normal outcome; only failing to start the process is an error.
pub trait Executor {
    fn run(&self, command: &[OsString], capture_output: bool) -> Result<ExecutionOutcome, HarnessError>;
}

/// Executor backed by `std::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill invocations that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Executor for ProcessExecutor {
    fn run(&self, command: &[OsString], capture_output: bool) -> Result<ExecutionOutcome, HarnessError> {
        let Some((program, args)) = command.split_first() else {
            return Err(HarnessError::EmptyCommand);
        };
        tracing::debug!(program = %program.to_string_lossy(), arg_count = args.len(), "spawning process");

        let launch_error = |source: io::Error| HarnessError::Launch {
            program: program.to_string_lossy().to_string(),
            source,
        };

        let mut cmd = Command::new(program);
        cmd.args(args);

        let outcome = match (self.timeout, capture_output) {
            (None, true) => cmd.output().map(ExecutionOutcome::from_output).map_err(launch_error)?,
            (None, false) => cmd.status().map(ExecutionOutcome::from_status).map_err(launch_error)?,
            (Some(limit), capture) => {
                if capture {
                    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
                }
                let child = cmd.spawn().map_err(launch_error)?;
                wait_with_deadline(child, limit).map_err(|source| HarnessError::Wait {
                    program: program.to_string_lossy().to_string(),
                    source,
                })?
            }
        };

        tracing::debug!(status = ?outcome.status, timed_out = outcome.timed_out, "process finished");
        Ok(outcome)
    }
}

/// Read a pipe to EOF on a detached thread, forwarding chunks as they arrive.
///
/// Detached so that a grandchild holding the pipe open cannot stall the caller past
/// its deadline; whatever was read before then is still delivered.
fn spawn_drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Gather drained chunks until the pipe closes or `deadline` passes (at least `DRAIN_GRACE` from now).
fn collect_drain(rx: &Receiver<Vec<u8>>, deadline: Instant) -> Vec<u8> {
    let until = deadline.max(Instant::now() + DRAIN_GRACE);
    let mut buf = Vec::new();
    loop {
        let remaining = until.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(_) => break,
        }
    }
    buf
}

/// Wait for `child`, killing it once `limit` has elapsed.
///
/// Only the direct child is killed. Output still held open by its descendants is
/// abandoned at the deadline, or `DRAIN_GRACE` after the child exits if that is later.
fn wait_with_deadline(mut child: Child, limit: Duration) -> io::Result<ExecutionOutcome> {
    let stdout = spawn_drain(child.stdout.take());
    let stderr = spawn_drain(child.stderr.take());
    let deadline = Instant::now() + limit;

    let (status, timed_out) = loop {
        match child.try_wait() {
            Ok(Some(status)) => break (status, false),
            Ok(None) if Instant::now() >= deadline => {
                tracing::warn!(limit_ms = limit.as_millis() as u64, "invocation timed out, killing");
                let _ = child.kill();
                break (child.wait()?, true);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        }
    };

    Ok(ExecutionOutcome {
        status: if timed_out { None } else { status.code() },
        stdout: collect_drain(&stdout, deadline),
        stderr: collect_drain(&stderr, deadline),
        timed_out,
    })
}

// ============================================================================
// Fixture Discovery Interface
// ============================================================================

/// List every regular file under a set of root directories.
///
/// Eligibility (extension) filtering is left to the caller.
pub trait FixtureDiscovery {
    /// Files under each root, recursively, concatenated in root order.
    ///
    /// Fails with `MissingRoot` if any root is not a directory; no partial list is returned.
    fn list_files(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>, HarnessError>;
}

/// Filesystem discovery via `walkdir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkDirDiscovery;

impl FixtureDiscovery for WalkDirDiscovery {
    #[tracing::instrument(skip_all, fields(root_count = roots.len()))]
    fn list_files(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>, HarnessError> {
        if let Some(missing) = roots.iter().find(|root| !root.is_dir()) {
            return Err(HarnessError::MissingRoot(missing.clone()));
        }

        let mut files = Vec::new();
        for root in roots {
            files.extend(walk_root(root));
        }

        tracing::debug!(file_count = files.len(), "discovery complete");
        Ok(files)
    }
}

fn walk_root(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

// ============================================================================
// Build Step Interface
// ============================================================================

/// Produce the toolchain binary before fixtures run.
pub trait BuildStep {
    /// Succeeds only if the build exited with status 0.
    fn build(&self) -> Result<(), HarnessError>;
}

/// Build by running an external command with inherited stdio.
#[derive(Debug, Clone)]
pub struct CommandBuildStep<E = ProcessExecutor> {
    command: Vec<OsString>,
    executor: E,
}

impl CommandBuildStep<ProcessExecutor> {
    pub fn new(command: Vec<OsString>) -> Self {
        Self::with_executor(command, ProcessExecutor::new())
    }
}

impl<E: Executor> CommandBuildStep<E> {
    pub fn with_executor(command: Vec<OsString>, executor: E) -> Self {
        Self { command, executor }
    }
}

impl<E: Executor> BuildStep for CommandBuildStep<E> {
    #[tracing::instrument(skip_all)]
    fn build(&self) -> Result<(), HarnessError> {
        let command = join_command(&self.command);
        tracing::info!(%command, "running build step");

        let outcome = self.executor.run(&self.command, false)?;
        if outcome.success() {
            Ok(())
        } else {
            Err(HarnessError::BuildFailed {
                command,
                status: outcome.status,
            })
        }
    }
}
