//! Integration tests for the fixture harness
//!
//! Library-level tests drive `run_harness` over real temp directories; CLI tests
//! spawn the built `lily-harness` binary. Toolchain processes are stood in for by
//! `true` / `false` so no script has to be written and made executable.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use lily_harness::{
    BuildStep, ConsoleReporter, ExecutionOutcome, Executor, HarnessConfig, HarnessError, ProcessExecutor,
    WalkDirDiscovery, run_harness,
};

/// Toolchain stand-in: exits 1 for `bad.lily`, 0 otherwise.
struct NameExecutor;

impl Executor for NameExecutor {
    fn run(&self, command: &[OsString], _capture_output: bool) -> Result<ExecutionOutcome, HarnessError> {
        let file = command.last().map(|f| f.to_string_lossy().to_string()).unwrap_or_default();
        Ok(ExecutionOutcome::exited(if file.ends_with("bad.lily") { 1 } else { 0 }))
    }
}

struct NoopBuild;

impl BuildStep for NoopBuild {
    fn build(&self) -> Result<(), HarnessError> {
        Ok(())
    }
}

fn fixture_tree(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "").unwrap();
    }
    dir
}

fn harness() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lily-harness"))
}

fn run_cli(args: &[&str], root: &Path) -> Output {
    harness().args(args).arg(root).arg("--color").arg("never").output().unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ============================================================================
// Library-level runs
// ============================================================================

#[test]
fn test_mixed_verdicts_over_real_tree() {
    let dir = fixture_tree(&["ok.lily", "bad.lily", "nested/also_ok.lily", "nested/notes.txt"]);
    let config = HarnessConfig::new().with_roots([dir.path()]);
    let mut reporter = ConsoleReporter::buffered(false, false);

    let stats = run_harness(&config, &NoopBuild, &WalkDirDiscovery, &NameExecutor, &mut reporter).unwrap();

    assert_eq!(stats.total(), 3);
    assert_eq!(stats.failure, 1);
    assert_eq!(stats.success, 2);

    let (out, _) = reporter.into_inner();
    let out = String::from_utf8(out).unwrap();
    let progress: Vec<&str> = out.lines().filter(|l| l.contains(" test ")).collect();
    assert_eq!(progress.len(), 3);
    assert!(progress[0].starts_with("1/3 test "));
    assert!(progress[2].starts_with("3/3 test "));
    assert!(out.contains("bad.lily ... failed"));
    assert!(out.contains("3 tests run in "));
    assert!(out.ends_with("1 failed (2 tests passed)\n"));
}

#[test]
fn test_txt_files_are_never_run() {
    let dir = fixture_tree(&["a.txt", "deep/b.txt"]);
    let config = HarnessConfig::new().with_roots([dir.path()]);
    let mut reporter = ConsoleReporter::buffered(false, false);

    let stats = run_harness(&config, &NoopBuild, &WalkDirDiscovery, &NameExecutor, &mut reporter).unwrap();
    assert_eq!(stats.total(), 0);
}

#[test]
fn test_missing_root_runs_nothing() {
    let dir = fixture_tree(&["ok.lily"]);
    let config = HarnessConfig::new().with_roots([dir.path().to_path_buf(), dir.path().join("missing_dir")]);
    let mut reporter = ConsoleReporter::buffered(false, false);

    let result = run_harness(&config, &NoopBuild, &WalkDirDiscovery, &NameExecutor, &mut reporter);

    assert!(matches!(result, Err(HarnessError::MissingRoot(p)) if p == dir.path().join("missing_dir")));
    let (out, _) = reporter.into_inner();
    assert!(out.is_empty());
}

#[cfg(unix)]
#[test]
fn test_real_processes_classify_by_exit_status() {
    let dir = fixture_tree(&["one.lily", "two.lily"]);

    let passing = HarnessConfig::new().with_roots([dir.path()]).with_toolchain("true");
    let stats = run_harness(
        &passing,
        &NoopBuild,
        &WalkDirDiscovery,
        &ProcessExecutor::new(),
        &mut ConsoleReporter::buffered(false, false),
    )
    .unwrap();
    assert_eq!((stats.success, stats.failure), (2, 0));

    let failing = HarnessConfig::new().with_roots([dir.path()]).with_toolchain("false");
    let stats = run_harness(
        &failing,
        &NoopBuild,
        &WalkDirDiscovery,
        &ProcessExecutor::new(),
        &mut ConsoleReporter::buffered(false, false),
    )
    .unwrap();
    assert_eq!((stats.success, stats.failure), (0, 2));
}

#[test]
fn test_absent_toolchain_is_launch_error() {
    let dir = fixture_tree(&["crash.lily"]);
    let config = HarnessConfig::new()
        .with_roots([dir.path()])
        .with_toolchain(dir.path().join("no_such_toolchain"));
    let mut reporter = ConsoleReporter::buffered(false, false);

    let result = run_harness(&config, &NoopBuild, &WalkDirDiscovery, &ProcessExecutor::new(), &mut reporter);

    assert!(matches!(result, Err(HarnessError::Launch { .. })));
    let (out, _) = reporter.into_inner();
    assert!(!String::from_utf8(out).unwrap().contains("failed"));
}

// ============================================================================
// CLI binary
// ============================================================================

#[test]
fn test_cli_empty_directory_reports_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(&["--no-build"], dir.path());

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("0 tests run in "));
    assert!(stdout.contains("0 failed (0 tests passed)"));
}

#[test]
fn test_cli_missing_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing: PathBuf = dir.path().join("missing_dir");
    let output = run_cli(&["--no-build"], &missing);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("error: the directory doesn't exist: `"));
    assert!(!stdout_of(&output).contains("tests run in"));
}

#[cfg(unix)]
#[test]
fn test_cli_build_failure_runs_no_fixtures() {
    let dir = fixture_tree(&["ok.lily"]);
    let output = run_cli(&["--build-cmd", "false", "--toolchain", "true"], dir.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("build step `false` failed (exit status 1)"));
    assert!(!stdout_of(&output).contains(" test "));
}

#[cfg(unix)]
#[test]
fn test_cli_exit_code_reflects_failures() {
    let dir = fixture_tree(&["a.lily", "b.lily"]);

    let output = run_cli(&["--no-build", "--toolchain", "true"], dir.path());
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("0 failed (2 tests passed)"));

    let output = run_cli(&["--no-build", "--toolchain", "false"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_of(&output).contains("2 failed (0 tests passed)"));
}

#[test]
fn test_cli_absent_toolchain_reports_launch_error() {
    let dir = fixture_tree(&["crash.lily"]);
    let toolchain = dir.path().join("missing").join("lily.exe");
    let output = run_cli(
        &["--no-build", "--toolchain", toolchain.to_str().unwrap()],
        dir.path(),
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("error: failed to launch"));
    assert!(!stdout_of(&output).contains("crash.lily ... failed"));
    assert!(!stdout_of(&output).contains("tests run in"));
}

#[cfg(unix)]
#[test]
fn test_cli_json_format() {
    let dir = fixture_tree(&["a.lily"]);
    let output = run_cli(&["--no-build", "--toolchain", "true", "--format", "json"], dir.path());

    assert!(output.status.success());
    let events: Vec<serde_json::Value> = stdout_of(&output)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["event"], "collected");
    assert_eq!(events.last().unwrap()["event"], "summary");
    assert_eq!(events.last().unwrap()["passed"], 1);
}
