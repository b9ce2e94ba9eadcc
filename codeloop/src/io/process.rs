//! Helpers for running child processes with timeouts and bounded output.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Lossily decoded, trimmed stdout.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    /// Lossily decoded, trimmed stderr.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.status.success()
    }
}

/// Build a [`Command`] from an argv-style vector plus trailing arguments.
pub fn command_from_argv(argv: &[String], extra: &[&std::ffi::OsStr]) -> Result<Command> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("command must be a non-empty array"))?;
    let mut cmd = Command::new(program);
    cmd.args(args).args(extra);
    Ok(cmd)
}

/// Grace period for draining pipes after the child exits or is killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

type StreamResult = Result<(Vec<u8>, usize)>;

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// Stdin is fed and output is read concurrently while the child runs.
/// `output_limit_bytes` bounds the amount of stdout/stderr stored in memory (bytes beyond this
/// are discarded while still draining the pipe). A child that exits without reading its stdin
/// is not an error.
///
/// On unix the child leads its own process group. On timeout the whole group is killed, and
/// processes it left running in the background are killed if they keep the pipes open past
/// the drain grace period, so the call returns within a bounded margin of `timeout`.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs_f64(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

    debug!(program = ?cmd.get_program(), "spawning child process");
    let started = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdin_rx = match stdin {
        Some(input) => {
            let mut child_stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            let input = input.to_vec();
            Some(spawn_with_channel(move || -> Result<()> {
                match child_stdin.write_all(&input) {
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e).context("write stdin"),
                    _ => Ok(()),
                }
            }))
        }
        None => None,
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_rx = spawn_with_channel(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_rx = spawn_with_channel(move || read_stream_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs_f64(),
                "command timed out, killing"
            );
            timed_out = true;
            kill_process_group(&child);
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    // Pipes stay open while any background process of the child holds them.
    let drain_deadline = Instant::now().max(started + timeout) + DRAIN_GRACE;
    let mut group_killed = timed_out;
    let mut collect = |rx: &Receiver<StreamResult>| -> Result<(Vec<u8>, usize)> {
        if let Some(result) = recv_by(rx, drain_deadline) {
            return result;
        }
        if !group_killed {
            warn!("background processes hold output pipes, killing process group");
            kill_process_group(&child);
            group_killed = true;
        }
        match recv_by(rx, Instant::now() + DRAIN_GRACE) {
            Some(result) => result,
            None => {
                warn!("output pipe still open after kill, abandoning reader");
                Ok((Vec::new(), 0))
            }
        }
    };
    let (stdout, stdout_truncated) = collect(&stdout_rx).context("read stdout")?;
    let (stderr, stderr_truncated) = collect(&stderr_rx).context("read stderr")?;

    if let Some(rx) = stdin_rx {
        match recv_by(&rx, Instant::now() + DRAIN_GRACE) {
            Some(result) => result?,
            None => warn!("stdin writer still blocked, abandoning it"),
        }
    }

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

/// Run `work` on its own thread; the result arrives on the returned channel.
///
/// A thread stuck on a pipe is detached rather than joined.
fn spawn_with_channel<T, F>(work: F) -> Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(work());
    });
    rx
}

fn recv_by<T>(rx: &Receiver<T>, deadline: Instant) -> Option<T> {
    let wait = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(wait) {
        Ok(value) => Some(value),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => {
            error!("pipe worker thread panicked");
            None
        }
    }
}

/// Kill the child's process group, including anything it left in the background.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(err) => warn!(err = %err, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
