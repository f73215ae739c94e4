//! Reporting for harness runs
//!
//! ## Message kinds
//!
//! Console text comes from exactly three renderers, one per `Message` variant:
//! progress lines, the end-of-run summary, and fatal error lines. Rendering is pure
//! (`Message::render` returns a `String`) so it can be tested without a terminal.
//!
//! ## TestReporter Trait
//!
//! The orchestrator reports through the `TestReporter` trait. `ConsoleReporter`
//! prints the human format; `JsonReporter` prints one JSON object per event for CI.

use std::io::{self, Stderr, Stdout, Write};

use serde_json::json;

use super::interfaces::HarnessError;
use super::stats::RunStatistics;
use super::test_runner::TestVerdict;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Visual style of a message fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Success,
    Failure,
}

/// Wrap `text` in the ANSI color for `style` when `color` is on.
pub fn paint(text: &str, style: Style, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    let code = match style {
        Style::Success => GREEN,
        Style::Failure => RED,
    };
    format!("{}{}{}", code, text, RESET)
}

/// One piece of console output
#[derive(Debug, Clone, Copy)]
pub enum Message<'a> {
    /// `<ordinal>/<total> test <file> ... <ok|failed>`
    Progress {
        verdict: &'a TestVerdict,
        ordinal: usize,
        total: usize,
    },
    /// `<total> tests run in <secs> seconds.` then `<failed> failed (<passed> tests passed)`
    Summary(&'a RunStatistics),
    /// `error: <reason>`
    FatalError(&'a HarnessError),
}

impl Message<'_> {
    pub fn render(&self, color: bool) -> String {
        match self {
            Message::Progress { verdict, ordinal, total } => {
                let status = if verdict.passed {
                    paint("ok", Style::Success, color)
                } else {
                    paint("failed", Style::Failure, color)
                };
                format!("{}/{} test {} ... {}", ordinal, total, verdict.file.display(), status)
            }
            Message::Summary(stats) => format!(
                "{} tests run in {:.3} seconds.\n{}{}",
                stats.total(),
                stats.elapsed_secs(),
                paint(&format!("{} failed", stats.failure), Style::Failure, color),
                paint(&format!(" ({} tests passed)", stats.success), Style::Success, color),
            ),
            Message::FatalError(error) => format!("error: {}", error),
        }
    }
}

/// Trait for reporting harness progress.
///
/// Implement this trait to customize output format.
pub trait TestReporter {
    /// Called once eligible fixtures are known, before any runs
    fn on_collection_complete(&mut self, _fixture_count: usize) {}

    /// Called after each fixture is classified
    fn on_test_complete(&mut self, verdict: &TestVerdict, ordinal: usize, total: usize);

    /// Called when every fixture has run
    fn on_run_complete(&mut self, stats: &RunStatistics);

    /// Called when the run stops on a fatal error; no summary follows
    fn on_fatal(&mut self, error: &HarnessError);
}

/// Default console reporter
pub struct ConsoleReporter<O: Write = Stdout, E: Write = Stderr> {
    out: O,
    err: E,
    color: bool,
    verbose: bool,
}

impl ConsoleReporter {
    /// Reporter on the process stdout/stderr.
    pub fn stdio(color: bool, verbose: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), color, verbose)
    }
}

impl ConsoleReporter<Vec<u8>, Vec<u8>> {
    /// Reporter writing into in-memory buffers.
    pub fn buffered(color: bool, verbose: bool) -> Self {
        Self::new(Vec::new(), Vec::new(), color, verbose)
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E, color: bool, verbose: bool) -> Self {
        Self {
            out,
            err,
            color,
            verbose,
        }
    }

    /// Give back the writers, mostly for inspecting output in tests.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> TestReporter for ConsoleReporter<O, E> {
    fn on_test_complete(&mut self, verdict: &TestVerdict, ordinal: usize, total: usize) {
        let line = Message::Progress { verdict, ordinal, total }.render(self.color);
        let _ = writeln!(self.out, "{}", line);

        if self.verbose && !verdict.passed {
            if verdict.timed_out {
                let _ = writeln!(self.out, "    (timed out)");
            }
            if let Some(output) = &verdict.output {
                for line in output.lines() {
                    let _ = writeln!(self.out, "    {}", line);
                }
            }
        }
        let _ = self.out.flush();
    }

    fn on_run_complete(&mut self, stats: &RunStatistics) {
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "{}", Message::Summary(stats).render(self.color));
        let _ = self.out.flush();
    }

    fn on_fatal(&mut self, error: &HarnessError) {
        let _ = writeln!(self.err, "{}", Message::FatalError(error).render(false));
        let _ = self.err.flush();
    }
}

/// JSON-lines reporter: one object per event on the output stream
pub struct JsonReporter<W: Write = Stdout> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: serde_json::Value) {
        let _ = writeln!(self.out, "{}", event);
        let _ = self.out.flush();
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_collection_complete(&mut self, fixture_count: usize) {
        self.emit(json!({ "event": "collected", "count": fixture_count }));
    }

    fn on_test_complete(&mut self, verdict: &TestVerdict, ordinal: usize, total: usize) {
        self.emit(json!({
            "event": "test",
            "ordinal": ordinal,
            "total": total,
            "file": verdict.file.display().to_string(),
            "passed": verdict.passed,
            "status": verdict.status,
            "timed_out": verdict.timed_out,
            "output": verdict.output,
        }));
    }

    fn on_run_complete(&mut self, stats: &RunStatistics) {
        self.emit(json!({
            "event": "summary",
            "total": stats.total(),
            "passed": stats.success,
            "failed": stats.failure,
            "elapsed_secs": stats.elapsed_secs(),
        }));
    }

    fn on_fatal(&mut self, error: &HarnessError) {
        self.emit(json!({ "event": "error", "message": error.to_string() }));
    }
}
