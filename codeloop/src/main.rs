//! codeloop CLI.
//!
//! Generates a program for a task, runs it against test cases, and feeds
//! failures back to the oracle until it passes or a budget runs out. Every
//! `solve` session leaves a transcript under the configured logs directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use codeloop::cases::suggest_cases;
use codeloop::core::classifier::assess;
use codeloop::core::types::{CaseOutcome, SessionEvent, SolveResult, TestCase};
use codeloop::exit_codes;
use codeloop::io::config::{
    DEFAULT_CONFIG_PATH, OracleBackendKind, SolverConfig, load_config, write_config,
};
use codeloop::io::oracle::{PromptedOracle, backend_from_config};
use codeloop::io::sandbox::{Sandbox, probe_interpreter};
use codeloop::io::task_file::{load_task_file, parse_case_arg};
use codeloop::io::transcript::Transcript;
use codeloop::logging;
use codeloop::solve::{PersistRequest, SessionLimits, SolveRequest, persist_session, solve_task};

const DEFAULT_CASE_COUNT: usize = 3;

#[derive(Parser)]
#[command(
    name = "codeloop",
    version,
    about = "Generate, test and debug small programs until they pass"
)]
struct Cli {
    /// Config file (missing file means defaults).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Run a full generate-test-debug session.
    Solve(SolveArgs),
    /// Check whether a task can be verified by program output.
    Classify {
        #[arg(long)]
        task: String,
    },
    /// Print suggested test cases as TOML `[[cases]]` entries.
    Cases {
        #[arg(long)]
        task: String,
        #[arg(long, default_value_t = DEFAULT_CASE_COUNT)]
        count: usize,
    },
    /// Check that the configured interpreter runs.
    CheckEnv,
}

#[derive(Args)]
struct SolveArgs {
    /// Task description.
    #[arg(long, required_unless_present = "task_file", conflicts_with = "task_file")]
    task: Option<String>,
    /// TOML file with `task`, optional `language` and `[[cases]]`.
    #[arg(long)]
    task_file: Option<PathBuf>,
    /// Test case as `INPUT=>EXPECTED`; `\n` stands for a newline.
    #[arg(long = "case", value_name = "INPUT=>EXPECTED")]
    cases: Vec<String>,
    /// Suggest test cases when none are given.
    #[arg(long)]
    generate_cases: bool,
    /// Solve even if the task does not look output-based.
    #[arg(long)]
    force: bool,
    #[arg(long)]
    max_attempts: Option<u32>,
    #[arg(long)]
    max_wall_time_secs: Option<u64>,
    #[arg(long)]
    max_duplicate_errors: Option<u32>,
    #[arg(long)]
    language: Option<String>,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Solve(args) => cmd_solve(&cli.config, args),
        Command::Classify { task } => Ok(cmd_classify(&task)),
        Command::Cases { task, count } => cmd_cases(&cli.config, &task, count),
        Command::CheckEnv => cmd_check_env(&cli.config),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if config_path.exists() && !force {
        println!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
        return Ok(exit_codes::OK);
    }
    write_config(config_path, &SolverConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_classify(task: &str) -> i32 {
    let assessment = assess(task);
    if assessment.suitable {
        println!("suitable");
        exit_codes::OK
    } else {
        println!("{}", assessment.category.warning());
        exit_codes::UNSUITABLE
    }
}

fn cmd_solve(config_path: &Path, args: SolveArgs) -> Result<i32> {
    let mut cfg = load_config(config_path)?;
    apply_overrides(&mut cfg, &args);
    cfg.validate().context("invalid settings after overrides")?;

    let (task, file_language, mut cases) = match (&args.task, &args.task_file) {
        (Some(task), _) => (task.clone(), None, Vec::new()),
        (None, Some(path)) => {
            let file = load_task_file(path)?;
            (file.task, file.language, file.cases)
        }
        (None, None) => bail!("either --task or --task-file is required"),
    };
    let language = args
        .language
        .clone()
        .or(file_language)
        .unwrap_or_else(|| cfg.language.clone());

    let assessment = assess(&task);
    if !assessment.suitable && !args.force {
        eprintln!("{}", assessment.category.warning());
        eprintln!("use --force to solve it anyway");
        return Ok(exit_codes::UNSUITABLE);
    }

    for raw in &args.cases {
        cases.push(parse_case_arg(raw)?);
    }

    let oracle = build_oracle(&cfg)?;
    if cases.is_empty() {
        if !args.generate_cases {
            bail!("no test cases: pass --case, use a task file with [[cases]], or --generate-cases");
        }
        let suggested = suggest_cases(&task, DEFAULT_CASE_COUNT, Some(&oracle));
        println!(
            "Using {} {} test cases",
            suggested.cases.len(),
            suggested.source.as_str()
        );
        cases = suggested.cases;
    }

    let sandbox = Sandbox::from_config(&cfg.sandbox);
    let request = SolveRequest {
        task: &task,
        language: &language,
        cases: &cases,
        limits: SessionLimits::from_config(&cfg),
    };

    let started_at = Local::now();
    let mut transcript = Transcript::new(&task, &language, &started_at);
    let report = solve_task(&request, &oracle, &oracle, &sandbox, |event| {
        print_progress(event, cases.len());
        transcript.record(event);
    })?;

    let persisted = persist_session(
        &PersistRequest {
            paths: &cfg.paths,
            task: &task,
            language: &language,
            started_at: &started_at,
            report: &report,
        },
        transcript,
    )?;

    println!("Result: {}", report.result);
    if let SolveResult::Success { source, .. } = &report.result {
        println!("\n{source}");
    }
    if let Some(path) = &persisted.final_code {
        println!("Final code: {}", path.display());
    }
    println!("Transcript: {}", persisted.transcript.text_path.display());
    Ok(exit_codes::for_result(report.result.kind()))
}

fn apply_overrides(cfg: &mut SolverConfig, args: &SolveArgs) {
    if let Some(value) = args.max_attempts {
        cfg.max_attempts = value;
    }
    if let Some(value) = args.max_wall_time_secs {
        cfg.max_wall_time_secs = value;
    }
    if let Some(value) = args.max_duplicate_errors {
        cfg.max_duplicate_errors = value;
    }
    if let Some(value) = &args.language {
        cfg.language = value.clone();
    }
}

fn build_oracle(cfg: &SolverConfig) -> Result<PromptedOracle> {
    let api_key = std::env::var(&cfg.oracle.api_key_env).ok();
    let backend = backend_from_config(&cfg.oracle, api_key)?;
    Ok(PromptedOracle::new(backend))
}

fn print_progress(event: &SessionEvent, total_cases: usize) {
    match event {
        SessionEvent::AttemptStarted { attempt, elapsed } => {
            println!("Attempt {attempt} ({:.1}s elapsed)", elapsed.as_secs_f64());
        }
        SessionEvent::SourceReady { .. } => {}
        SessionEvent::CaseFinished { index, outcome, .. } => match outcome {
            CaseOutcome::Passed { .. } => println!("  case {index}/{total_cases}: passed"),
            CaseOutcome::Mismatch { actual, expected } => println!(
                "  case {index}/{total_cases}: expected '{expected}' but got '{actual}'"
            ),
            CaseOutcome::ExecutionError { stderr, .. } => {
                let last_line = stderr.lines().last().unwrap_or_default();
                println!("  case {index}/{total_cases}: error: {last_line}");
            }
        },
        SessionEvent::Finished { .. } => {}
    }
}

#[derive(Serialize)]
struct CasesDoc {
    cases: Vec<TestCase>,
}

fn cmd_cases(config_path: &Path, task: &str, count: usize) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let oracle = match build_oracle(&cfg) {
        Ok(oracle) => Some(oracle),
        Err(err) => {
            tracing::warn!(err = %format!("{err:#}"), "oracle unavailable, skipping proposal");
            None
        }
    };
    let suggested = suggest_cases(task, count, oracle.as_ref());
    let doc = toml::to_string(&CasesDoc {
        cases: suggested.cases,
    })
    .context("serialize cases")?;
    println!("# source: {}", suggested.source.as_str());
    print!("{doc}");
    Ok(exit_codes::OK)
}

fn cmd_check_env(config_path: &Path) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let version = probe_interpreter(&cfg.sandbox)?;
    println!("interpreter: {} ({version})", cfg.sandbox.interpreter.join(" "));
    match cfg.oracle.backend {
        OracleBackendKind::Gemini => {
            let key_state = if std::env::var(&cfg.oracle.api_key_env).is_ok() {
                "set"
            } else {
                "not set"
            };
            println!(
                "oracle: gemini {} (${} {key_state})",
                cfg.oracle.model, cfg.oracle.api_key_env
            );
        }
        OracleBackendKind::Command => {
            println!("oracle: command {}", cfg.oracle.command.join(" "));
        }
    }
    Ok(exit_codes::OK)
}
