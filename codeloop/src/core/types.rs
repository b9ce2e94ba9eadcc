//! Shared deterministic types for the solver.
//!
//! These types define stable contracts between components. They do not
//! depend on external state or I/O.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::signature::headline;

/// One input/expected-output pair. Identity is its position in the suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected: expected.into(),
        }
    }
}

/// Captured output of one sandboxed run. Empty `stderr` means success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.stderr.is_empty()
    }
}

/// Outcome of running one test case within an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed {
        actual: String,
    },
    Mismatch {
        actual: String,
        expected: String,
    },
    /// The program wrote to stderr (crash, timeout, unresolved dependency).
    ExecutionError {
        stderr: String,
        signature: String,
    },
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed { .. })
    }
}

/// Terminal outcome of a solving session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    /// Every test case passed on `attempt`.
    Success { source: String, attempt: u32 },
    /// The attempt budget ran out.
    Exhausted { attempts: u32 },
    /// The wall-clock budget was exceeded before starting another attempt.
    TimedOut { elapsed: Duration, attempts: u32 },
    /// The same normalized error recurred `occurrences` times.
    Stuck {
        signature: String,
        occurrences: u32,
        attempt: u32,
    },
}

impl SolveResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            SolveResult::Success { .. } => ResultKind::Success,
            SolveResult::Exhausted { .. } => ResultKind::Exhausted,
            SolveResult::TimedOut { .. } => ResultKind::TimedOut,
            SolveResult::Stuck { .. } => ResultKind::Stuck,
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            SolveResult::Success { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveResult::Success { attempt, .. } => write!(f, "success on attempt {attempt}"),
            SolveResult::Exhausted { attempts } => {
                write!(f, "exhausted after {attempts} attempts")
            }
            SolveResult::TimedOut { elapsed, attempts } => write!(
                f,
                "timed out after {:.1}s ({attempts} attempts)",
                elapsed.as_secs_f64()
            ),
            SolveResult::Stuck {
                signature,
                occurrences,
                attempt,
            } => write!(
                f,
                "stuck on attempt {attempt}: same error {occurrences} times: {}",
                headline(signature)
            ),
        }
    }
}

/// Serializable tag for [`SolveResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Success,
    Exhausted,
    TimedOut,
    Stuck,
}

/// Progress notification emitted by the orchestrator as a session unfolds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AttemptStarted {
        attempt: u32,
        elapsed: Duration,
    },
    SourceReady {
        attempt: u32,
        source: String,
    },
    /// `index` is 1-based.
    CaseFinished {
        attempt: u32,
        index: usize,
        input: String,
        outcome: CaseOutcome,
    },
    Finished {
        result: SolveResult,
        elapsed: Duration,
    },
}
