//! Stable exit codes for codeloop CLI commands.

use crate::core::types::ResultKind;

/// Command succeeded; for `solve`, every test case passed.
pub const OK: i32 = 0;
/// Invalid config, task file or arguments, or another infrastructure error.
pub const INVALID: i32 = 1;
/// `solve` used every attempt without passing.
pub const EXHAUSTED: i32 = 2;
/// `solve` stopped because the same error kept recurring.
pub const STUCK: i32 = 3;
/// `solve` ran out of wall-clock time.
pub const TIMED_OUT: i32 = 4;
/// The task was rejected as not output-based (`solve` without `--force`, or `classify`).
pub const UNSUITABLE: i32 = 5;

pub fn for_result(kind: ResultKind) -> i32 {
    match kind {
        ResultKind::Success => OK,
        ResultKind::Exhausted => EXHAUSTED,
        ResultKind::Stuck => STUCK,
        ResultKind::TimedOut => TIMED_OUT,
    }
}
