//! CLI tests that spawn the codeloop binary.
//!
//! Only commands that need neither an interpreter nor an oracle are covered
//! here; see `investigation.rs` for the rest.

use std::fs;
use std::process::Command;

use codeloop::exit_codes;
use codeloop::io::config::{SolverConfig, load_config};

fn codeloop() -> Command {
    Command::new(env!("CARGO_BIN_EXE_codeloop"))
}

#[test]
fn classify_accepts_output_based_task() {
    let output = codeloop()
        .args(["classify", "--task", "Calculate the factorial of a number"])
        .output()
        .expect("codeloop classify");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "suitable");
}

#[test]
fn classify_rejects_file_task() {
    let output = codeloop()
        .args(["classify", "--task", "Save file with the results"])
        .output()
        .expect("codeloop classify");

    assert_eq!(output.status.code(), Some(exit_codes::UNSUITABLE));
    assert!(String::from_utf8_lossy(&output.stdout).contains("File operations"));
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config_path = temp.path().join(".codeloop").join("config.toml");

    let status = codeloop()
        .current_dir(temp.path())
        .arg("init")
        .status()
        .expect("codeloop init");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(
        load_config(&config_path).expect("load"),
        SolverConfig::default()
    );

    fs::write(&config_path, "max_attempts = 7\n").expect("edit config");
    let status = codeloop()
        .current_dir(temp.path())
        .arg("init")
        .status()
        .expect("codeloop init again");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(load_config(&config_path).expect("load").max_attempts, 7);
}

#[test]
fn solve_rejects_unsuitable_task_without_force() {
    let temp = tempfile::tempdir().expect("tempdir");
    let status = codeloop()
        .current_dir(temp.path())
        .args([
            "solve",
            "--task",
            "Train a neural network model",
            "--case",
            "=>done",
        ])
        .status()
        .expect("codeloop solve");

    assert_eq!(status.code(), Some(exit_codes::UNSUITABLE));
    assert!(!temp.path().join("logs").exists());
}

#[test]
fn invalid_config_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config_path = temp.path().join("bad.toml");
    fs::write(&config_path, "max_attempts = 0\n").expect("write config");

    let status = codeloop()
        .current_dir(temp.path())
        .args(["--config", "bad.toml", "check-env"])
        .status()
        .expect("codeloop check-env");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn cases_prints_canned_suite_as_toml() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = codeloop()
        .current_dir(temp.path())
        .env_remove("GEMINI_API_KEY")
        .args(["cases", "--task", "Add two numbers"])
        .output()
        .expect("codeloop cases");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# source: canned\n"));
    let doc: toml::Value = toml::from_str(&stdout).expect("toml");
    let cases = doc["cases"].as_array().expect("cases array");
    assert_eq!(cases.len(), 3);
    assert_eq!(cases[0]["input"].as_str(), Some("5\n3"));
    assert_eq!(cases[0]["expected"].as_str(), Some("8"));
}
