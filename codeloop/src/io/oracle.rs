//! Code-generation oracle: collaborator contracts and backends.
//!
//! The solver only sees [`Generator`] and [`Debugger`], which always return
//! program text. [`PromptedOracle`] implements both on top of a
//! [`CompletionBackend`] and absorbs backend failures by returning a minimal
//! fallback program. Backends receive their credentials at construction.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::cases::parse_generated_cases;
use crate::core::fence::strip_code_fence;
use crate::core::types::TestCase;
use crate::io::config::{OracleBackendKind, OracleConfig};
use crate::io::process::{command_from_argv, run_command_with_timeout};
use crate::io::prompt::PromptEngine;

const COMMAND_OUTPUT_LIMIT_BYTES: usize = 1_000_000;

/// Produces a fresh program for a task.
pub trait Generator {
    fn generate(&self, task: &str, language: &str) -> String;
}

/// Produces a revised program given feedback from the previous attempt.
pub trait Debugger {
    fn debug(&self, task: &str, feedback: &str, language: &str) -> String;
}

/// Proposes test cases for a task.
pub trait CaseProposer {
    fn propose_cases(&self, task: &str, count: usize) -> Result<Vec<TestCase>>;
}

/// Raw prompt-in, text-out completion service.
pub trait CompletionBackend {
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Backend label for logs.
    fn name(&self) -> &str;
}

/// Google Gemini `generateContent` over blocking HTTP.
pub struct GeminiBackend {
    api_key: String,
    model: String,
    base_url: String,
    agent: ureq::Agent,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Self {
        Self {
            api_key,
            model,
            base_url,
            agent: ureq::Agent::new_with_config(
                ureq::config::Config::builder()
                    .timeout_global(Some(timeout))
                    .build(),
            ),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl CompletionBackend for GeminiBackend {
    #[instrument(skip_all, fields(model = %self.model, prompt_bytes = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [
                {"role": "user", "parts": [{"text": prompt}]}
            ]
        });

        let mut response = self
            .agent
            .post(&self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .send_json(&body)
            .context("gemini request")?;

        let json: Value = response
            .body_mut()
            .read_json()
            .context("parse gemini response")?;
        let text = extract_gemini_text(&json)?;
        debug!(reply_bytes = text.len(), "gemini reply received");
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Concatenated text parts of the first candidate.
fn extract_gemini_text(json: &Value) -> Result<String> {
    if let Some(err) = json.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        bail!("gemini API error: {message}");
    }
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("gemini response has no candidate content"))?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        bail!("empty response from gemini");
    }
    Ok(text)
}

/// Backend that runs an external command with the prompt on stdin and reads
/// the reply from stdout.
pub struct CommandBackend {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandBackend {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

impl CompletionBackend for CommandBackend {
    #[instrument(skip_all, fields(program = ?self.command.first(), prompt_bytes = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<String> {
        let cmd = command_from_argv(&self.command, &[])?;
        let output = run_command_with_timeout(
            cmd,
            Some(prompt.as_bytes()),
            self.timeout,
            COMMAND_OUTPUT_LIMIT_BYTES,
        )
        .with_context(|| format!("run oracle command {:?}", self.command))?;
        if output.timed_out {
            bail!("oracle command timed out after {:?}", self.timeout);
        }
        if !output.status.success() {
            bail!(
                "oracle command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_text()
            );
        }
        let reply = output.stdout_text();
        if reply.is_empty() {
            bail!("oracle command produced no output");
        }
        Ok(reply)
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Build the configured backend. `api_key` is only required for Gemini.
pub fn backend_from_config(
    cfg: &OracleConfig,
    api_key: Option<String>,
) -> Result<Box<dyn CompletionBackend>> {
    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    match cfg.backend {
        OracleBackendKind::Gemini => {
            let api_key = api_key
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    anyhow!(
                        "missing API key: set ${} or use the command backend",
                        cfg.api_key_env
                    )
                })?;
            Ok(Box::new(GeminiBackend::new(
                api_key,
                cfg.model.clone(),
                cfg.base_url.clone(),
                timeout,
            )))
        }
        OracleBackendKind::Command => Ok(Box::new(CommandBackend::new(cfg.command.clone(), timeout))),
    }
}

/// Which oracle call produced a fallback program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleStage {
    Generate,
    Debug,
}

/// Minimal runnable program used when the backend fails.
///
/// It prints a marker line, so it fails every meaningful test case and the
/// next attempt asks the debugger again.
pub fn fallback_program(language: &str, stage: OracleStage) -> String {
    let message = match stage {
        OracleStage::Generate => "Code generation failed.",
        OracleStage::Debug => "Code generation failed during debug step.",
    };
    match language.trim().to_lowercase().as_str() {
        "python" => format!(
            "def main():\n    print(\"{message}\")\n\n\nif __name__ == \"__main__\":\n    main()\n"
        ),
        "java" => format!(
            "public class Solution {{\n    public static void main(String[] args) {{\n        System.out.println(\"{message}\");\n    }}\n}}\n"
        ),
        _ => format!("// {message}\n"),
    }
}

/// [`Generator`] and [`Debugger`] backed by templated prompts.
pub struct PromptedOracle {
    backend: Box<dyn CompletionBackend>,
    prompts: PromptEngine,
}

impl PromptedOracle {
    pub fn new(backend: Box<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            prompts: PromptEngine::new(),
        }
    }

    fn ask_for_code(&self, prompt: &str) -> Result<String> {
        let reply = self.backend.complete(prompt)?;
        let code = strip_code_fence(&reply);
        if code.is_empty() {
            bail!("{} backend returned no code", self.backend.name());
        }
        Ok(code)
    }
}

impl CaseProposer for PromptedOracle {
    #[instrument(skip_all, fields(backend = self.backend.name(), count = count))]
    fn propose_cases(&self, task: &str, count: usize) -> Result<Vec<TestCase>> {
        let prompt = self.prompts.render_test_cases(task, count)?;
        let reply = self.backend.complete(&prompt)?;
        let cases = parse_generated_cases(&reply, count);
        info!(parsed = cases.len(), "oracle proposed test cases");
        Ok(cases)
    }
}

impl Generator for PromptedOracle {
    #[instrument(skip_all, fields(backend = self.backend.name(), language = %language))]
    fn generate(&self, task: &str, language: &str) -> String {
        let result = self
            .prompts
            .render_generate(task, language)
            .and_then(|prompt| self.ask_for_code(&prompt));
        match result {
            Ok(code) => code,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "generation failed, using fallback program");
                fallback_program(language, OracleStage::Generate)
            }
        }
    }
}

impl Debugger for PromptedOracle {
    #[instrument(skip_all, fields(backend = self.backend.name(), language = %language, feedback_bytes = feedback.len()))]
    fn debug(&self, task: &str, feedback: &str, language: &str) -> String {
        let result = self
            .prompts
            .render_debug(task, feedback, language)
            .and_then(|prompt| self.ask_for_code(&prompt));
        match result {
            Ok(code) => code,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "debug failed, using fallback program");
                fallback_program(language, OracleStage::Debug)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Replays canned replies and records every prompt it receives.
    struct ScriptedBackend {
        replies: RefCell<Vec<Result<String>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: RefCell::new(replies),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl CompletionBackend for &ScriptedBackend {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            let mut replies = self.replies.borrow_mut();
            if replies.is_empty() {
                return Err(anyhow!("no scripted reply"));
            }
            replies.remove(0)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn oracle(backend: &'static ScriptedBackend) -> PromptedOracle {
        PromptedOracle::new(Box::new(backend))
    }

    fn leak(backend: ScriptedBackend) -> &'static ScriptedBackend {
        Box::leak(Box::new(backend))
    }

    #[test]
    fn generate_strips_code_fence() {
        let backend = leak(ScriptedBackend::new(vec![Ok(
            "```python\nprint(int(input()) + int(input()))\n```".to_string(),
        )]));
        let code = oracle(backend).generate("add two numbers", "python");
        assert_eq!(code, "print(int(input()) + int(input()))");
        assert!(backend.prompts.borrow()[0].contains("Task: add two numbers"));
    }

    #[test]
    fn generate_falls_back_on_backend_error() {
        let backend = leak(ScriptedBackend::new(vec![Err(anyhow!("quota exceeded"))]));
        let code = oracle(backend).generate("add two numbers", "python");
        assert_eq!(code, fallback_program("python", OracleStage::Generate));
        assert!(code.contains("def main():"));
    }

    #[test]
    fn debug_sends_feedback_and_falls_back_on_empty_reply() {
        let backend = leak(ScriptedBackend::new(vec![Ok("```\n```".to_string())]));
        let code = oracle(backend).debug(
            "add two numbers",
            "Test Case 1: Expected '8' but got '53'",
            "python",
        );
        assert_eq!(code, fallback_program("python", OracleStage::Debug));
        assert!(backend.prompts.borrow()[0].contains("Expected '8' but got '53'"));
    }

    #[test]
    fn propose_cases_parses_reply() {
        let backend = leak(ScriptedBackend::new(vec![Ok(
            "Input: 2\n3\nOutput: 8\nInput: 5\n2\nOutput: 25".to_string(),
        )]));
        let cases = oracle(backend)
            .propose_cases("raise a number to a power", 3)
            .expect("cases");
        assert_eq!(cases, vec![TestCase::new("2\n3", "8"), TestCase::new("5\n2", "25")]);
    }

    #[test]
    fn fallback_programs_per_language() {
        assert!(fallback_program("Java", OracleStage::Generate).contains("public class Solution"));
        assert_eq!(
            fallback_program("ruby", OracleStage::Debug),
            "// Code generation failed during debug step.\n"
        );
    }

    #[test]
    fn extracts_text_from_gemini_response() {
        let json = serde_json::json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "print("}, {"text": "1)"}]}}
            ]
        });
        assert_eq!(extract_gemini_text(&json).expect("text"), "print(1)");
    }

    #[test]
    fn gemini_errors_are_reported() {
        let json = serde_json::json!({"error": {"message": "API key not valid"}});
        let err = extract_gemini_text(&json).unwrap_err();
        assert!(err.to_string().contains("API key not valid"));

        let json = serde_json::json!({"candidates": []});
        assert!(extract_gemini_text(&json).is_err());
    }

    #[test]
    fn gemini_endpoint_joins_base_and_model() {
        let backend = GeminiBackend::new(
            "key".to_string(),
            "gemini-1.5-flash".to_string(),
            "https://example.test/v1beta/".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn gemini_backend_requires_api_key() {
        let cfg = OracleConfig::default();
        let err = backend_from_config(&cfg, None)
            .err()
            .expect("missing key should fail");
        assert!(err.to_string().contains("GEMINI_API_KEY"));
        let backend = backend_from_config(&cfg, Some("key".to_string())).expect("backend");
        assert_eq!(backend.name(), "gemini");
    }

    #[cfg(unix)]
    #[test]
    fn command_backend_pipes_prompt_through_command() {
        let backend = CommandBackend::new(vec!["cat".to_string()], Duration::from_secs(5));
        assert_eq!(backend.complete("print(1)\n").expect("reply"), "print(1)");

        let failing = CommandBackend::new(
            vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()],
            Duration::from_secs(5),
        );
        let err = failing.complete("prompt").unwrap_err();
        assert!(err.to_string().contains("status Some(3)"));
    }
}
