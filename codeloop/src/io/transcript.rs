//! Per-session transcript under the logs directory.
//!
//! The transcript is the product log of a session: it is always written,
//! independent of `RUST_LOG`. Each session produces
//! `attempt_<YYYYmmdd_HHMMSS>.txt` (human-readable, built from
//! [`SessionEvent`]s) and a JSON summary with the same stem.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::core::signature::{ErrorTable, headline};
use crate::core::types::{CaseOutcome, ResultKind, SessionEvent};

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `20260102_030405` style stamp used in log file names.
pub fn session_stamp(started_at: &DateTime<Local>) -> String {
    started_at.format(STAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptPaths {
    pub text_path: PathBuf,
    pub summary_path: PathBuf,
}

impl TranscriptPaths {
    pub fn new(logs_dir: &Path, started_at: &DateTime<Local>) -> Self {
        let stem = format!("attempt_{}", session_stamp(started_at));
        Self {
            text_path: logs_dir.join(format!("{stem}.txt")),
            summary_path: logs_dir.join(format!("{stem}.json")),
        }
    }
}

/// Machine-readable session summary written next to the transcript.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub task: String,
    pub language: String,
    pub started_at: String,
    pub result: ResultKind,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub stuck_signature: Option<String>,
    pub errors: ErrorTable,
}

/// Accumulates the human-readable log of one session.
#[derive(Debug, Clone)]
pub struct Transcript {
    buf: String,
}

impl Transcript {
    pub fn new(task: &str, language: &str, started_at: &DateTime<Local>) -> Self {
        let mut buf = String::new();
        let _ = writeln!(buf, "Task: {task}");
        let _ = writeln!(buf, "Language: {language}");
        let _ = writeln!(buf, "Started: {}", started_at.to_rfc3339());
        Self { buf }
    }

    pub fn record(&mut self, event: &SessionEvent) {
        let buf = &mut self.buf;
        match event {
            SessionEvent::AttemptStarted { attempt, elapsed } => {
                let _ = writeln!(
                    buf,
                    "\n=== Attempt {attempt} (elapsed {:.1}s) ===",
                    elapsed.as_secs_f64()
                );
            }
            SessionEvent::SourceReady { source, .. } => {
                let _ = writeln!(buf, "--- Source ---");
                push_block(buf, source);
                let _ = writeln!(buf, "--- End source ---");
            }
            SessionEvent::CaseFinished {
                index,
                input,
                outcome,
                ..
            } => match outcome {
                CaseOutcome::Passed { actual } => {
                    let _ = writeln!(buf, "Test Case {index}: passed");
                    let _ = writeln!(buf, "  input: {input:?}");
                    let _ = writeln!(buf, "  output: {actual:?}");
                }
                CaseOutcome::Mismatch { actual, expected } => {
                    let _ = writeln!(
                        buf,
                        "Test Case {index}: Expected '{expected}' but got '{actual}'"
                    );
                    let _ = writeln!(buf, "  input: {input:?}");
                }
                CaseOutcome::ExecutionError { stderr, signature } => {
                    let _ = writeln!(buf, "Test Case {index}: Execution Error:");
                    push_block(buf, stderr);
                    let _ = writeln!(buf, "  input: {input:?}");
                    let _ = writeln!(buf, "  signature: {}", headline(signature));
                }
            },
            SessionEvent::Finished { result, elapsed } => {
                let _ = writeln!(
                    buf,
                    "\n=== Result: {result} (elapsed {:.1}s) ===",
                    elapsed.as_secs_f64()
                );
            }
        }
    }

    /// Append the error-frequency table, most frequent first.
    pub fn record_errors(&mut self, errors: &ErrorTable) {
        if errors.is_empty() {
            return;
        }
        let _ = writeln!(self.buf, "\n=== Error frequency ===");
        for (signature, count) in errors.by_frequency() {
            let _ = writeln!(self.buf, "{count}x {}", headline(signature));
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

fn push_block(buf: &mut String, text: &str) {
    buf.push_str(text);
    if !text.ends_with('\n') {
        buf.push('\n');
    }
}

/// Write the transcript and its JSON summary, creating the logs directory.
pub fn write_transcript(
    paths: &TranscriptPaths,
    transcript: &Transcript,
    summary: &SessionSummary,
) -> Result<()> {
    if let Some(dir) = paths.text_path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create logs dir {}", dir.display()))?;
    }
    fs::write(&paths.text_path, transcript.as_str())
        .with_context(|| format!("write {}", paths.text_path.display()))?;
    let mut payload = serde_json::to_string_pretty(summary).context("serialize session summary")?;
    payload.push('\n');
    fs::write(&paths.summary_path, payload)
        .with_context(|| format!("write {}", paths.summary_path.display()))?;
    Ok(())
}
