//! Solver configuration stored under `.codeloop/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config location relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".codeloop/config.toml";

/// Solver configuration (TOML).
///
/// Intended to be edited by humans. Missing fields default to the values the
/// solver ships with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SolverConfig {
    /// Language label passed to the oracle prompts.
    pub language: String,

    /// Hard limit on attempts per session.
    pub max_attempts: u32,

    /// Session wall-clock budget in seconds, checked before each attempt.
    pub max_wall_time_secs: u64,

    /// Stop once the same normalized error has occurred this many times.
    pub max_duplicate_errors: u32,

    pub sandbox: SandboxConfig,
    pub oracle: OracleConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter argv; the temp file path is appended.
    pub interpreter: Vec<String>,
    /// Suffix for the temp file holding the program.
    pub file_suffix: String,
    pub run_timeout_secs: u64,
    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
    pub install: InstallConfig,
}

/// Automatic installation of a missing dependency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallConfig {
    pub enabled: bool,
    /// Package manager argv; the package name is appended.
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackendKind {
    Gemini,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    pub backend: OracleBackendKind,
    pub model: String,
    /// Environment variable holding the API key (read once at startup).
    pub api_key_env: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Command for the `command` backend; the prompt is written to its stdin.
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for per-session transcripts.
    pub logs_dir: PathBuf,
    /// Where the last successful program is written.
    pub final_code: PathBuf,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
            max_attempts: 50,
            max_wall_time_secs: 5 * 60,
            max_duplicate_errors: 2,
            sandbox: SandboxConfig::default(),
            oracle: OracleConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: vec!["python".to_string()],
            file_suffix: ".py".to_string(),
            run_timeout_secs: 10,
            output_limit_bytes: 1_000_000,
            install: InstallConfig::default(),
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: vec!["pip".to_string(), "install".to_string()],
            timeout_secs: 30,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackendKind::Gemini,
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 120,
            command: vec![
                "codex".to_string(),
                "exec".to_string(),
                "--skip-git-repo-check".to_string(),
                "-".to_string(),
            ],
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            final_code: PathBuf::from("output/final_code.txt"),
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(anyhow!("language must be non-empty"));
        }
        if self.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be > 0"));
        }
        if self.max_wall_time_secs == 0 {
            return Err(anyhow!("max_wall_time_secs must be > 0"));
        }
        if self.max_duplicate_errors == 0 {
            return Err(anyhow!("max_duplicate_errors must be > 0"));
        }
        if self.sandbox.run_timeout_secs == 0 {
            return Err(anyhow!("sandbox.run_timeout_secs must be > 0"));
        }
        if self.sandbox.output_limit_bytes == 0 {
            return Err(anyhow!("sandbox.output_limit_bytes must be > 0"));
        }
        if is_blank_argv(&self.sandbox.interpreter) {
            return Err(anyhow!("sandbox.interpreter must be a non-empty array"));
        }
        if self.sandbox.install.enabled {
            if is_blank_argv(&self.sandbox.install.command) {
                return Err(anyhow!("sandbox.install.command must be a non-empty array"));
            }
            if self.sandbox.install.timeout_secs == 0 {
                return Err(anyhow!("sandbox.install.timeout_secs must be > 0"));
            }
        }
        if self.oracle.request_timeout_secs == 0 {
            return Err(anyhow!("oracle.request_timeout_secs must be > 0"));
        }
        match self.oracle.backend {
            OracleBackendKind::Gemini if self.oracle.api_key_env.trim().is_empty() => {
                return Err(anyhow!("oracle.api_key_env must be non-empty"));
            }
            OracleBackendKind::Command if is_blank_argv(&self.oracle.command) => {
                return Err(anyhow!("oracle.command must be a non-empty array"));
            }
            _ => {}
        }
        Ok(())
    }

    pub fn max_wall_time(&self) -> Duration {
        Duration::from_secs(self.max_wall_time_secs)
    }
}

fn is_blank_argv(argv: &[String]) -> bool {
    argv.first().is_none_or(|program| program.trim().is_empty())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SolverConfig::default()`.
pub fn load_config(path: &Path) -> Result<SolverConfig> {
    if !path.exists() {
        let cfg = SolverConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SolverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SolverConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Write `contents` to `path` through a sibling temp file and a rename.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("path has no file name {}", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
