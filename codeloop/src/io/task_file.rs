//! Task definitions loaded from TOML files or command-line case arguments.
//!
//! ```toml
//! task = "Add two numbers"
//! language = "python"
//!
//! [[cases]]
//! input = "5\n3"
//! expected = "8"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::core::types::TestCase;

const CASE_SEPARATOR: &str = "=>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFile {
    pub task: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

impl TaskFile {
    pub fn validate(&self) -> Result<()> {
        if self.task.trim().is_empty() {
            bail!("task must not be empty");
        }
        if self
            .language
            .as_deref()
            .is_some_and(|language| language.trim().is_empty())
        {
            bail!("language must not be empty when set");
        }
        Ok(())
    }
}

pub fn load_task_file(path: &Path) -> Result<TaskFile> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let task: TaskFile =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    task.validate()
        .with_context(|| format!("invalid task file {}", path.display()))?;
    Ok(task)
}

/// Parse an `INPUT=>EXPECTED` argument. A literal `\n` becomes a newline.
pub fn parse_case_arg(raw: &str) -> Result<TestCase> {
    let Some((input, expected)) = raw.split_once(CASE_SEPARATOR) else {
        bail!("invalid case {raw:?}: expected INPUT{CASE_SEPARATOR}EXPECTED");
    };
    Ok(TestCase::new(unescape_newlines(input), unescape_newlines(expected)))
}

fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_task_with_cases() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("task.toml");
        fs::write(
            &path,
            "task = \"Add two numbers\"\n\n[[cases]]\ninput = \"5\\n3\"\nexpected = \"8\"\n\n[[cases]]\ninput = \"0\\n0\"\nexpected = \"0\"\n",
        )
        .expect("write");

        let task = load_task_file(&path).expect("load");
        assert_eq!(task.task, "Add two numbers");
        assert_eq!(task.language, None);
        assert_eq!(
            task.cases,
            vec![TestCase::new("5\n3", "8"), TestCase::new("0\n0", "0")]
        );
    }

    #[test]
    fn rejects_blank_task() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("task.toml");
        fs::write(&path, "task = \"  \"\n").expect("write");

        let err = load_task_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("task must not be empty"));
    }

    #[test]
    fn case_arg_unescapes_newlines() {
        let case = parse_case_arg("5\\n3=>8").expect("case");
        assert_eq!(case, TestCase::new("5\n3", "8"));
    }

    #[test]
    fn case_arg_splits_on_first_separator() {
        let case = parse_case_arg("=>a=>b").expect("case");
        assert_eq!(case, TestCase::new("", "a=>b"));
    }

    #[test]
    fn case_arg_requires_separator() {
        assert!(parse_case_arg("5 3 8").is_err());
    }
}
