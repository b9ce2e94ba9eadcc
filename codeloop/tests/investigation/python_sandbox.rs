//! Sandbox and orchestrator runs against the real `python` interpreter.

use std::time::{Duration, Instant};

use codeloop::core::types::{ResultKind, TestCase};
use codeloop::io::config::SandboxConfig;
use codeloop::io::sandbox::{Sandbox, SandboxSettings, probe_interpreter};
use codeloop::solve::{SessionLimits, SolveRequest, solve_task};
use codeloop::test_support::{RecordingInstaller, ScriptedOracle};

fn python_settings(timeout: Duration) -> SandboxSettings {
    SandboxSettings {
        run_timeout: timeout,
        ..SandboxSettings::from_config(&SandboxConfig::default())
    }
}

#[test]
#[ignore]
fn python_is_available() {
    let version = probe_interpreter(&SandboxConfig::default()).expect("python --version");
    assert!(version.starts_with("Python"), "{version}");
}

#[test]
#[ignore]
fn python_echo_round_trip() {
    let sandbox: Sandbox<RecordingInstaller> =
        Sandbox::new(python_settings(Duration::from_secs(10)), None);
    let output = sandbox.execute("print(input())", "abc");
    assert_eq!(output.stdout, "abc");
    assert_eq!(output.stderr, "");
}

#[test]
#[ignore]
fn python_infinite_loop_times_out() {
    let sandbox: Sandbox<RecordingInstaller> =
        Sandbox::new(python_settings(Duration::from_secs(1)), None);
    let started = Instant::now();
    let output = sandbox.execute("while True:\n    pass\n", "");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(output.stdout, "");
    assert!(output.stderr.contains("timed out"), "{}", output.stderr);
}

#[test]
#[ignore]
fn python_missing_module_requests_install() {
    let installer = RecordingInstaller::new(None, false);
    let sandbox = Sandbox::new(python_settings(Duration::from_secs(10)), Some(installer));
    let output = sandbox.execute("import codeloop_missing_pkg.sub\n", "");
    assert_eq!(
        output.stderr,
        "Failed to install required package 'codeloop_missing_pkg'"
    );
}

#[test]
#[ignore]
fn add_two_numbers_solves_on_first_attempt() {
    let oracle = ScriptedOracle::repeating("a = int(input())\nb = int(input())\nprint(a + b)\n");
    let sandbox: Sandbox<RecordingInstaller> =
        Sandbox::new(python_settings(Duration::from_secs(10)), None);
    let cases = vec![TestCase::new("5\n3", "8"), TestCase::new("0\n0", "0")];
    let request = SolveRequest {
        task: "Add two numbers",
        language: "python",
        cases: &cases,
        limits: SessionLimits {
            max_attempts: 3,
            max_wall_time: Duration::from_secs(60),
            max_duplicate_errors: 2,
        },
    };

    let report = solve_task(&request, &oracle, &oracle, &sandbox, |_| {}).expect("solve");
    assert_eq!(report.result.kind(), ResultKind::Success);
    assert_eq!(report.attempts, 1);
}
