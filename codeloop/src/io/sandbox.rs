//! Sandboxed execution of generated programs.
//!
//! Each run writes the program to its own temp file, runs
//! `<interpreter...> <file>` with the test input on stdin under a timeout, and
//! deletes the file on every exit path. A missing-module failure triggers one
//! install through a [`DependencyInstaller`] followed by one re-run.
//!
//! The sandbox never returns an error: timeouts, install failures and spawn
//! faults come back as stderr text in a [`RunOutput`].

use std::ffi::OsStr;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tempfile::TempPath;
use tracing::{debug, info, instrument, warn};

use crate::core::types::RunOutput;
use crate::io::config::{InstallConfig, SandboxConfig};
use crate::io::process::{command_from_argv, run_command_with_timeout};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const INSTALL_OUTPUT_LIMIT_BYTES: usize = 100_000;

static MISSING_MODULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"No module named ['"]([^'"]+)['"]"#).expect("missing module regex")
});

/// Runs a program against one input.
pub trait CodeRunner {
    fn run(&self, source: &str, stdin: &str) -> RunOutput;
}

/// Installs a missing dependency into the execution environment.
pub trait DependencyInstaller {
    fn install(&self, package: &str) -> Result<()>;
}

/// Installer that shells out to a package manager (`pip install <name>`).
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandInstaller {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    pub fn from_config(cfg: &InstallConfig) -> Self {
        Self::new(cfg.command.clone(), Duration::from_secs(cfg.timeout_secs))
    }
}

impl DependencyInstaller for CommandInstaller {
    #[instrument(skip(self), fields(timeout_secs = self.timeout.as_secs()))]
    fn install(&self, package: &str) -> Result<()> {
        info!("installing missing package");
        let cmd = command_from_argv(&self.command, &[OsStr::new(package)])?;
        let output = run_command_with_timeout(cmd, None, self.timeout, INSTALL_OUTPUT_LIMIT_BYTES)
            .with_context(|| format!("run installer for {package}"))?;
        if output.timed_out {
            bail!("timed out installing {package} after {:?}", self.timeout);
        }
        if !output.status.success() {
            bail!(
                "installer exited with {:?}: {}",
                output.status.code(),
                output.stderr_text()
            );
        }
        info!("package installed");
        Ok(())
    }
}

/// Interpreter invocation settings.
#[derive(Debug, Clone)]
pub struct SandboxSettings {
    pub interpreter: Vec<String>,
    pub file_suffix: String,
    pub run_timeout: Duration,
    pub output_limit_bytes: usize,
}

impl SandboxSettings {
    pub fn from_config(cfg: &SandboxConfig) -> Self {
        Self {
            interpreter: cfg.interpreter.clone(),
            file_suffix: cfg.file_suffix.clone(),
            run_timeout: Duration::from_secs(cfg.run_timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
        }
    }
}

/// Production [`CodeRunner`]. Passing no installer disables dependency recovery.
#[derive(Debug, Clone)]
pub struct Sandbox<I = CommandInstaller> {
    settings: SandboxSettings,
    installer: Option<I>,
}

impl Sandbox<CommandInstaller> {
    pub fn from_config(cfg: &SandboxConfig) -> Self {
        let installer = cfg
            .install
            .enabled
            .then(|| CommandInstaller::from_config(&cfg.install));
        Self::new(SandboxSettings::from_config(cfg), installer)
    }
}

impl<I: DependencyInstaller> Sandbox<I> {
    pub fn new(settings: SandboxSettings, installer: Option<I>) -> Self {
        Self {
            settings,
            installer,
        }
    }

    /// Run `source` with `stdin` piped in; see the module docs for failure handling.
    #[instrument(skip_all, fields(source_bytes = source.len(), stdin_bytes = stdin.len()))]
    pub fn execute(&self, source: &str, stdin: &str) -> RunOutput {
        match self.try_execute(source, stdin) {
            Ok(output) => output,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "sandbox fault");
                RunOutput::failed(self.describe_fault(&err))
            }
        }
    }

    fn try_execute(&self, source: &str, stdin: &str) -> Result<RunOutput> {
        // Dropping the TempPath removes the file, ignoring removal errors.
        let program = write_program(source, &self.settings.file_suffix)?;
        let first = self.run_program(&program, stdin)?;

        let Some(package) = missing_dependency(&first.stderr) else {
            return Ok(first);
        };
        let Some(installer) = &self.installer else {
            debug!(package = %package, "missing dependency, installer disabled");
            return Ok(first);
        };
        if let Err(err) = installer.install(&package) {
            warn!(package = %package, err = %format!("{err:#}"), "dependency install failed");
            return Ok(RunOutput::failed(format!(
                "Failed to install required package '{package}'"
            )));
        }
        info!(package = %package, "retrying execution with installed package");
        self.run_program(&program, stdin)
    }

    fn run_program(&self, program: &Path, stdin: &str) -> Result<RunOutput> {
        let cmd = command_from_argv(&self.settings.interpreter, &[program.as_os_str()])?;
        let output = run_command_with_timeout(
            cmd,
            Some(stdin.as_bytes()),
            self.settings.run_timeout,
            self.settings.output_limit_bytes,
        )?;
        if output.timed_out {
            return Ok(RunOutput::failed(format!(
                "Code execution timed out ({} seconds limit)",
                self.settings.run_timeout.as_secs_f64()
            )));
        }
        Ok(RunOutput {
            stdout: output.stdout_text(),
            stderr: output.stderr_text(),
        })
    }

    fn describe_fault(&self, err: &anyhow::Error) -> String {
        let interpreter_missing = err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io_err| io_err.kind() == ErrorKind::NotFound)
        });
        if interpreter_missing {
            let program = self
                .settings
                .interpreter
                .first()
                .map_or("", String::as_str);
            return format!("Interpreter '{program}' not found. Ensure it is installed and on PATH.");
        }
        format!("Execution failed: {err:#}")
    }
}

impl<I: DependencyInstaller> CodeRunner for Sandbox<I> {
    fn run(&self, source: &str, stdin: &str) -> RunOutput {
        self.execute(source, stdin)
    }
}

fn write_program(source: &str, suffix: &str) -> Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("tmp")
        .suffix(suffix)
        .tempfile()
        .context("create program temp file")?;
    file.write_all(source.as_bytes())
        .context("write program temp file")?;
    file.flush().context("flush program temp file")?;
    Ok(file.into_temp_path())
}

/// Top-level package named by a "No module named '...'" failure, if any.
pub fn missing_dependency(stderr: &str) -> Option<String> {
    let caps = MISSING_MODULE_RE.captures(stderr)?;
    let module = caps.get(1)?.as_str();
    let package = module.split('.').next().unwrap_or(module).trim();
    (!package.is_empty()).then(|| package.to_string())
}

/// Report the interpreter version (`<interpreter> --version`).
pub fn probe_interpreter(cfg: &SandboxConfig) -> Result<String> {
    let cmd = command_from_argv(&cfg.interpreter, &[OsStr::new("--version")])?;
    let output = run_command_with_timeout(cmd, None, PROBE_TIMEOUT, 10_000)
        .with_context(|| format!("run {:?} --version", cfg.interpreter))?;
    if !output.succeeded() {
        bail!(
            "{:?} --version failed with status {:?}",
            cfg.interpreter,
            output.status.code()
        );
    }
    let stdout = output.stdout_text();
    Ok(if stdout.is_empty() {
        output.stderr_text()
    } else {
        stdout
    })
}
