//! Output comparison for test cases.

use crate::core::signature::normalize_error;
use crate::core::types::{CaseOutcome, RunOutput, TestCase};

/// Absolute tolerance used when both outputs are numeric.
pub const FLOAT_TOLERANCE: f64 = 1e-6;

/// Decide whether `actual` program output matches `expected`.
///
/// Both sides are trimmed. When both parse as floating-point numbers they
/// match iff their absolute difference is below [`FLOAT_TOLERANCE`] (absolute,
/// not relative). Otherwise the trimmed strings must be equal; internal
/// whitespace and case are significant.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    let actual = actual.trim();
    let expected = expected.trim();
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(e)) => (a - e).abs() < FLOAT_TOLERANCE,
        _ => actual == expected,
    }
}

/// Classify one run against its case. Any stderr text makes it an execution
/// error, whatever stdout holds.
pub fn judge_case(case: &TestCase, output: RunOutput) -> CaseOutcome {
    if output.has_error() {
        let signature = normalize_error(&output.stderr);
        return CaseOutcome::ExecutionError {
            stderr: output.stderr,
            signature,
        };
    }
    let actual = output.stdout.trim().to_string();
    if outputs_match(&actual, &case.expected) {
        CaseOutcome::Passed { actual }
    } else {
        CaseOutcome::Mismatch {
            actual,
            expected: case.expected.trim().to_string(),
        }
    }
}

/// Feedback line for a failed case; `None` when it passed.
pub fn feedback_line(index: usize, outcome: &CaseOutcome) -> Option<String> {
    match outcome {
        CaseOutcome::Passed { .. } => None,
        CaseOutcome::Mismatch { actual, expected } => Some(format!(
            "Test Case {index}: Expected '{expected}' but got '{actual}'\n"
        )),
        CaseOutcome::ExecutionError { stderr, .. } => {
            Some(format!("Test Case {index}: Execution Error:\n{stderr}\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_within_tolerance_match() {
        assert!(outputs_match("3.0000001", "3.0"));
        assert!(outputs_match("8", "8.0"));
        assert!(outputs_match(" -5 \n", "-5"));
    }

    #[test]
    fn numeric_values_outside_tolerance_differ() {
        assert!(!outputs_match("3.01", "3.0"));
        assert!(!outputs_match("1e6", "1000000.1"));
    }

    #[test]
    fn tolerance_is_absolute_not_relative() {
        assert!(!outputs_match("1000000000.001", "1000000000"));
        assert!(outputs_match("0.0000001", "0.0000005"));
    }

    #[test]
    fn text_compares_after_trimming() {
        assert!(outputs_match(" hi ", "hi"));
        assert!(outputs_match("hello world\n", "hello world"));
        assert!(!outputs_match("Hi", "hi"));
        assert!(!outputs_match("hello  world", "hello world"));
    }

    #[test]
    fn mixed_numeric_and_text_falls_back_to_string_equality() {
        assert!(!outputs_match("8", "eight"));
        assert!(outputs_match("True", "True"));
        assert!(!outputs_match("", "0"));
    }

    #[test]
    fn nan_never_matches() {
        assert!(!outputs_match("NaN", "NaN"));
    }

    #[test]
    fn stderr_wins_over_matching_stdout() {
        let case = TestCase::new("5\n3", "8");
        let output = RunOutput {
            stdout: "8".to_string(),
            stderr: "DeprecationWarning: old api".to_string(),
        };
        let outcome = judge_case(&case, output);
        assert!(matches!(outcome, CaseOutcome::ExecutionError { .. }));
    }

    #[test]
    fn judged_mismatch_produces_feedback() {
        let case = TestCase::new("5\n3", "8");
        let outcome = judge_case(&case, RunOutput::ok("53\n"));
        assert_eq!(
            outcome,
            CaseOutcome::Mismatch {
                actual: "53".to_string(),
                expected: "8".to_string(),
            }
        );
        assert_eq!(
            feedback_line(2, &outcome).as_deref(),
            Some("Test Case 2: Expected '8' but got '53'\n")
        );
    }

    #[test]
    fn execution_error_feedback_carries_raw_stderr() {
        let case = TestCase::new("", "1");
        let outcome = judge_case(&case, RunOutput::failed("Traceback\nNameError: x"));
        assert_eq!(
            feedback_line(1, &outcome).as_deref(),
            Some("Test Case 1: Execution Error:\nTraceback\nNameError: x\n")
        );
        assert_eq!(feedback_line(1, &judge_case(&case, RunOutput::ok("1"))), None);
    }
}
