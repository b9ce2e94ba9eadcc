//! Prompt rendering for the oracle.

use anyhow::Result;
use minijinja::{Environment, context};

const GENERATE_TEMPLATE: &str = include_str!("prompts/generate.md");
const DEBUG_TEMPLATE: &str = include_str!("prompts/debug.md");
const TEST_CASES_TEMPLATE: &str = include_str!("prompts/test_cases.md");

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("generate", GENERATE_TEMPLATE)
            .expect("generate template should be valid");
        env.add_template("debug", DEBUG_TEMPLATE)
            .expect("debug template should be valid");
        env.add_template("test_cases", TEST_CASES_TEMPLATE)
            .expect("test_cases template should be valid");
        Self { env }
    }

    pub fn render_generate(&self, task: &str, language: &str) -> Result<String> {
        let template = self.env.get_template("generate")?;
        let rendered = template.render(context! {
            task => task.trim(),
            language => display_language(language),
        })?;
        Ok(rendered)
    }

    pub fn render_debug(&self, task: &str, feedback: &str, language: &str) -> Result<String> {
        let template = self.env.get_template("debug")?;
        let rendered = template.render(context! {
            task => task.trim(),
            feedback => (!feedback.trim().is_empty()).then(|| feedback.trim()),
            language => display_language(language),
        })?;
        Ok(rendered)
    }

    pub fn render_test_cases(&self, task: &str, count: usize) -> Result<String> {
        let template = self.env.get_template("test_cases")?;
        let rendered = template.render(context! {
            task => task.trim(),
            count => count,
        })?;
        Ok(rendered)
    }
}

/// `python` -> `Python`.
fn display_language(language: &str) -> String {
    let language = language.trim();
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
