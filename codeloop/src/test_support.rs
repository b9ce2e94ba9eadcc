//! Test doubles for the solver's collaborators.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::core::types::RunOutput;
use crate::io::oracle::{Debugger, Generator};
use crate::io::sandbox::{CodeRunner, DependencyInstaller};

/// One recorded oracle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleCall {
    Generate {
        task: String,
        language: String,
    },
    Debug {
        task: String,
        feedback: String,
        language: String,
    },
}

/// Generator and debugger that replay queued sources.
///
/// The last queued source is repeated once the queue is down to one entry.
pub struct ScriptedOracle {
    sources: RefCell<VecDeque<String>>,
    calls: RefCell<Vec<OracleCall>>,
}

impl ScriptedOracle {
    pub fn new<S: Into<String>>(sources: impl IntoIterator<Item = S>) -> Self {
        let sources: VecDeque<String> = sources.into_iter().map(Into::into).collect();
        assert!(!sources.is_empty(), "scripted oracle needs at least one source");
        Self {
            sources: RefCell::new(sources),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Always answer with `source`.
    pub fn repeating(source: &str) -> Self {
        Self::new([source])
    }

    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Feedback strings passed to `debug`, in order.
    pub fn feedbacks(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                OracleCall::Debug { feedback, .. } => Some(feedback.clone()),
                OracleCall::Generate { .. } => None,
            })
            .collect()
    }

    fn next_source(&self) -> String {
        let mut sources = self.sources.borrow_mut();
        if sources.len() > 1 {
            sources.pop_front().unwrap_or_default()
        } else {
            sources.front().cloned().unwrap_or_default()
        }
    }
}

impl Generator for ScriptedOracle {
    fn generate(&self, task: &str, language: &str) -> String {
        self.calls.borrow_mut().push(OracleCall::Generate {
            task: task.to_string(),
            language: language.to_string(),
        });
        self.next_source()
    }
}

impl Debugger for ScriptedOracle {
    fn debug(&self, task: &str, feedback: &str, language: &str) -> String {
        self.calls.borrow_mut().push(OracleCall::Debug {
            task: task.to_string(),
            feedback: feedback.to_string(),
            language: language.to_string(),
        });
        self.next_source()
    }
}

type RunHandler = Box<dyn Fn(&str, &str) -> RunOutput>;

/// Code runner that answers through a closure of `(source, stdin)`.
pub struct ScriptedRunner {
    handler: RunHandler,
    runs: RefCell<Vec<(String, String)>>,
}

impl ScriptedRunner {
    pub fn new(handler: impl Fn(&str, &str) -> RunOutput + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            runs: RefCell::new(Vec::new()),
        }
    }

    /// `(source, stdin)` pairs in call order.
    pub fn runs(&self) -> Vec<(String, String)> {
        self.runs.borrow().clone()
    }
}

impl CodeRunner for ScriptedRunner {
    fn run(&self, source: &str, stdin: &str) -> RunOutput {
        self.runs
            .borrow_mut()
            .push((source.to_string(), stdin.to_string()));
        (self.handler)(source, stdin)
    }
}

/// Records install calls and optionally creates a marker file on success.
pub struct RecordingInstaller {
    calls: RefCell<Vec<String>>,
    marker: Option<PathBuf>,
    succeed: bool,
}

impl RecordingInstaller {
    pub fn new(marker: Option<PathBuf>, succeed: bool) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            marker,
            succeed,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl DependencyInstaller for RecordingInstaller {
    fn install(&self, package: &str) -> Result<()> {
        self.calls.borrow_mut().push(package.to_string());
        if !self.succeed {
            return Err(anyhow!("no such package: {package}"));
        }
        if let Some(marker) = &self.marker {
            fs::write(marker, "")?;
        }
        Ok(())
    }
}
