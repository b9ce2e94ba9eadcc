//! Retry orchestration for one solving session.
//!
//! Attempt 1 asks the [`Generator`] for a program; every later attempt asks the
//! [`Debugger`] with the previous attempt's feedback. Each attempt runs the
//! cases in order and stops at the first failure. The session ends on the
//! first of: all cases pass, the same normalized error reaches
//! `max_duplicate_errors`, `max_attempts` is used up, or the wall-clock budget
//! is found exceeded at an attempt boundary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use tracing::{debug, info, instrument, warn};

use crate::core::budget::WallClock;
use crate::core::evaluator::{feedback_line, judge_case};
use crate::core::signature::ErrorTable;
use crate::core::types::{CaseOutcome, SessionEvent, SolveResult, TestCase};
use crate::io::config::{PathsConfig, SolverConfig};
use crate::io::oracle::{Debugger, Generator};
use crate::io::result_store::write_final_code;
use crate::io::sandbox::CodeRunner;
use crate::io::transcript::{SessionSummary, Transcript, TranscriptPaths, write_transcript};

/// Budgets for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_attempts: u32,
    pub max_wall_time: Duration,
    /// Occurrences of one error signature that end the session as stuck.
    pub max_duplicate_errors: u32,
}

impl SessionLimits {
    pub fn from_config(cfg: &SolverConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            max_wall_time: cfg.max_wall_time(),
            max_duplicate_errors: cfg.max_duplicate_errors,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveRequest<'a> {
    pub task: &'a str,
    pub language: &'a str,
    pub cases: &'a [TestCase],
    pub limits: SessionLimits,
}

/// Everything a finished session reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub result: SolveResult,
    /// Attempts actually started.
    pub attempts: u32,
    pub elapsed: Duration,
    pub errors: ErrorTable,
}

/// What one attempt left behind for the next one.
struct AttemptOutcome {
    passed: bool,
    feedback: String,
    signature: Option<String>,
}

/// Drive a session to its terminal result.
///
/// `on_event` sees every [`SessionEvent`] in order, ending with `Finished`.
/// Errors are returned only for an invalid request; domain failures end up in
/// [`SessionReport::result`].
#[instrument(skip_all, fields(language = request.language, cases = request.cases.len()))]
pub fn solve_task<G, D, R>(
    request: &SolveRequest<'_>,
    generator: &G,
    debugger: &D,
    runner: &R,
    mut on_event: impl FnMut(&SessionEvent),
) -> Result<SessionReport>
where
    G: Generator + ?Sized,
    D: Debugger + ?Sized,
    R: CodeRunner + ?Sized,
{
    validate_request(request)?;
    let limits = request.limits;
    let clock = WallClock::start(limits.max_wall_time);
    let mut errors = ErrorTable::new();
    let mut feedback = String::new();
    let mut attempts = 0;

    let result = loop {
        if let Some(elapsed) = clock.exceeded() {
            info!(attempts, elapsed_ms = elapsed.as_millis() as u64, "wall-clock budget exceeded");
            break SolveResult::TimedOut { elapsed, attempts };
        }
        attempts += 1;
        let attempt = attempts;
        info!(attempt, "attempt started");
        on_event(&SessionEvent::AttemptStarted {
            attempt,
            elapsed: clock.elapsed(),
        });

        let source = if attempt == 1 {
            generator.generate(request.task, request.language)
        } else {
            debugger.debug(request.task, &feedback, request.language)
        };
        on_event(&SessionEvent::SourceReady {
            attempt,
            source: source.clone(),
        });

        let outcome = run_attempt(request.cases, runner, attempt, &source, &mut on_event);
        if outcome.passed {
            info!(attempt, "all cases passed");
            break SolveResult::Success { source, attempt };
        }

        if let Some(signature) = outcome.signature {
            let occurrences = errors.record(&signature);
            debug!(attempt, occurrences, "execution error recorded");
            if occurrences >= limits.max_duplicate_errors {
                warn!(attempt, occurrences, "same error repeated, giving up");
                break SolveResult::Stuck {
                    signature,
                    occurrences,
                    attempt,
                };
            }
        }

        if attempt >= limits.max_attempts {
            info!(attempt, "attempt budget exhausted");
            break SolveResult::Exhausted { attempts: attempt };
        }
        feedback = outcome.feedback;
    };

    let elapsed = clock.elapsed();
    on_event(&SessionEvent::Finished {
        result: result.clone(),
        elapsed,
    });
    Ok(SessionReport {
        result,
        attempts,
        elapsed,
        errors,
    })
}

fn validate_request(request: &SolveRequest<'_>) -> Result<()> {
    if request.cases.is_empty() {
        bail!("at least one test case is required");
    }
    if request.limits.max_attempts == 0 {
        bail!("max_attempts must be at least 1");
    }
    if request.limits.max_duplicate_errors == 0 {
        bail!("max_duplicate_errors must be at least 1");
    }
    Ok(())
}

fn run_attempt<R: CodeRunner + ?Sized>(
    cases: &[TestCase],
    runner: &R,
    attempt: u32,
    source: &str,
    on_event: &mut impl FnMut(&SessionEvent),
) -> AttemptOutcome {
    for (position, case) in cases.iter().enumerate() {
        let index = position + 1;
        let outcome = judge_case(case, runner.run(source, &case.input));
        let failure = feedback_line(index, &outcome);
        let signature = match &outcome {
            CaseOutcome::ExecutionError { signature, .. } => Some(signature.clone()),
            _ => None,
        };
        on_event(&SessionEvent::CaseFinished {
            attempt,
            index,
            input: case.input.clone(),
            outcome,
        });
        if let Some(feedback) = failure {
            debug!(attempt, index, "case failed");
            return AttemptOutcome {
                passed: false,
                feedback,
                signature,
            };
        }
    }
    AttemptOutcome {
        passed: true,
        feedback: String::new(),
        signature: None,
    }
}

/// Where a session's artifacts were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub transcript: TranscriptPaths,
    /// Set only for successful sessions.
    pub final_code: Option<PathBuf>,
}

pub struct PersistRequest<'a> {
    pub paths: &'a PathsConfig,
    pub task: &'a str,
    pub language: &'a str,
    pub started_at: &'a DateTime<Local>,
    pub report: &'a SessionReport,
}

/// Write the transcript and summary; on success also replace the final code.
pub fn persist_session(
    request: &PersistRequest<'_>,
    mut transcript: Transcript,
) -> Result<PersistedSession> {
    let report = request.report;
    transcript.record_errors(&report.errors);

    let paths = TranscriptPaths::new(&request.paths.logs_dir, request.started_at);
    let summary = SessionSummary {
        task: request.task.to_string(),
        language: request.language.to_string(),
        started_at: request.started_at.to_rfc3339(),
        result: report.result.kind(),
        attempts: report.attempts,
        elapsed_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        stuck_signature: match &report.result {
            SolveResult::Stuck { signature, .. } => Some(signature.clone()),
            _ => None,
        },
        errors: report.errors.clone(),
    };
    write_transcript(&paths, &transcript, &summary)?;
    info!(path = %paths.text_path.display(), "transcript written");

    let final_code = match report.result.source() {
        Some(source) => {
            write_final_code(&request.paths.final_code, source)?;
            Some(request.paths.final_code.clone())
        }
        None => None,
    };

    Ok(PersistedSession {
        transcript: paths,
        final_code,
    })
}
