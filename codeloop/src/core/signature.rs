//! Failure signatures for repeated-error detection.
//!
//! A signature is a failure trace with its volatile parts (line numbers, file
//! paths, temp file names, stack-frame lines) removed, so two attempts that
//! hit the same underlying bug produce the same key.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static LINE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"line \d+").expect("line number regex"));
static QUOTED_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"File "[^"]*""#).expect("quoted file regex"));
static TEMP_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tmp\w+(\.\w+)").expect("temp file regex"));

/// Canonicalize a raw failure trace into a comparable signature.
///
/// Idempotent: `normalize_error(&normalize_error(x)) == normalize_error(x)`.
pub fn normalize_error(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let normalized = LINE_NUMBER_RE.replace_all(raw, "line X");
    let normalized = QUOTED_FILE_RE.replace_all(&normalized, "File \"X\"");
    let normalized = TEMP_FILE_RE.replace_all(&normalized, "tmpX$1");

    normalized
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_stack_frame(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_stack_frame(line: &str) -> bool {
    line.starts_with("File \"")
}

/// Short human-readable label for a signature (text after the last `:`).
pub fn headline(signature: &str) -> &str {
    signature.rsplit(':').next().unwrap_or(signature).trim()
}

/// Occurrence counts per signature for one session.
///
/// Counts only ever increase; entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorTable {
    counts: BTreeMap<String, u32>,
}

impl ErrorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `signature` and return the new count.
    pub fn record(&mut self, signature: &str) -> u32 {
        let count = self.counts.entry(signature.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, signature: &str) -> u32 {
        self.counts.get(signature).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Entries by descending count, ties broken by signature text.
    pub fn by_frequency(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self
            .counts
            .iter()
            .map(|(signature, count)| (signature.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE_A: &str = "Traceback (most recent call last):\n  File \"/tmp/tmpab12cd.py\", line 3, in <module>\n    x = int(input())\nValueError: invalid literal for int() with base 10: 'abc'";
    const TRACE_B: &str = "Traceback (most recent call last):\n  File \"/tmp/tmpzz99yy.py\", line 7, in <module>\n    x = int(input())\nValueError: invalid literal for int() with base 10: 'abc'";

    #[test]
    fn empty_input_normalizes_to_empty() {
        assert_eq!(normalize_error(""), "");
        assert_eq!(normalize_error("  \n "), "");
    }

    #[test]
    fn drops_stack_frames_and_keeps_message() {
        let normalized = normalize_error(TRACE_A);
        assert_eq!(
            normalized,
            "Traceback (most recent call last):\nx = int(input())\nValueError: invalid literal for int() with base 10: 'abc'"
        );
    }

    #[test]
    fn traces_differing_in_line_and_temp_path_collapse() {
        assert_eq!(normalize_error(TRACE_A), normalize_error(TRACE_B));
    }

    #[test]
    fn line_numbers_outside_frames_are_replaced() {
        assert_eq!(
            normalize_error("SyntaxError at line 12"),
            normalize_error("SyntaxError at line 40")
        );
        assert_eq!(normalize_error("SyntaxError at line 12"), "SyntaxError at line X");
    }

    #[test]
    fn temp_file_names_are_replaced() {
        assert_eq!(
            normalize_error("cannot open tmpq1w2e3.py"),
            "cannot open tmpX.py"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            TRACE_A,
            "SyntaxError at line 12",
            "  File \"x\", line 1\nNameError: name 'y' is not defined",
            "Code execution timed out (10 seconds limit)",
            "weird  tmpabc.py line 3\n\n\tFile \"a\"",
        ];
        for sample in samples {
            let once = normalize_error(sample);
            assert_eq!(normalize_error(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn headline_takes_last_segment() {
        assert_eq!(
            headline("NameError: name 'y' is not defined"),
            "name 'y' is not defined"
        );
        assert_eq!(headline("no colon here"), "no colon here");
    }

    #[test]
    fn error_table_counts_only_increase() {
        let mut table = ErrorTable::new();
        assert_eq!(table.record("a"), 1);
        assert_eq!(table.record("b"), 1);
        assert_eq!(table.record("a"), 2);
        assert_eq!(table.count("a"), 2);
        assert_eq!(table.count("missing"), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.by_frequency(), vec![("a", 2), ("b", 1)]);
    }
}
