//! Streaming subprocess runner.
//!
//! Stdout is read line by line on a helper thread and handed to the
//! caller as it arrives; stderr is captured whole for error reporting.
//! The runner owns the child: if the cancel token trips while the
//! process is alive, it is killed and reaped before returning.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::errors::{ProcessError, ProcessResult};

/// Shared cancellation switch.
///
/// Clones share the same flag; tripping any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// How a streamed process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The process exited on its own. Death by signal reports `-1`.
    Exited { code: i32, stderr: String },
    /// The process was killed because the token was cancelled.
    Cancelled,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Exited { code: 0, .. })
    }
}

/// Output of a process run to completion.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().to_string()
}

/// Run a command, feeding each stdout line to `on_line`.
///
/// The cancel token is checked before spawning and then at least every
/// `poll` while the process runs.
pub fn run_streaming<F>(
    mut cmd: Command,
    cancel: &CancelToken,
    poll: Duration,
    mut on_line: F,
) -> ProcessResult<RunOutcome>
where
    F: FnMut(&str),
{
    if cancel.is_cancelled() {
        return Ok(RunOutcome::Cancelled);
    }

    let program = program_name(&cmd);
    tracing::debug!("Spawning {} with {} argument(s)", program, cmd.get_args().len());

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ProcessError::spawn(&program, e))?;

    let stdout = child.stdout.take().ok_or_else(|| {
        ProcessError::io(
            "capturing stdout",
            std::io::Error::other("stdout was not piped"),
        )
    })?;
    let mut stderr = child.stderr.take().ok_or_else(|| {
        ProcessError::io(
            "capturing stderr",
            std::io::Error::other("stderr was not piped"),
        )
    })?;

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    });
    let stderr_handle = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).to_string()
    });

    // Drain stdout until EOF, watching the token between lines.
    loop {
        if cancel.is_cancelled() {
            kill_and_reap(&mut child, &program);
            return Ok(RunOutcome::Cancelled);
        }
        match rx.recv_timeout(poll) {
            Ok(line) => on_line(&line),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Stdout closed; the process may still be finishing.
    let status = loop {
        if cancel.is_cancelled() {
            kill_and_reap(&mut child, &program);
            return Ok(RunOutcome::Cancelled);
        }
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => thread::sleep(poll),
            Err(e) => return Err(ProcessError::io(format!("waiting for {}", program), e)),
        }
    };

    let stderr = stderr_handle.join().unwrap_or_default();
    let code = exit_code(status);
    tracing::debug!("{} exited with code {}", program, code);

    Ok(RunOutcome::Exited { code, stderr })
}

fn kill_and_reap(child: &mut std::process::Child, program: &str) {
    tracing::info!("Cancelling: terminating {} (pid {})", program, child.id());
    if let Err(e) = child.kill() {
        // Already exited between the check and the kill
        tracing::debug!("kill({}) failed: {}", program, e);
    }
    if let Err(e) = child.wait() {
        tracing::warn!("Failed to reap {}: {}", program, e);
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Run a command to completion and capture both streams.
pub fn run_captured(mut cmd: Command) -> ProcessResult<CapturedOutput> {
    let program = program_name(&cmd);
    tracing::debug!("Running {} with {} argument(s)", program, cmd.get_args().len());

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ProcessError::spawn(&program, e))?;

    Ok(CapturedOutput {
        code: exit_code(output.status),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn streams_lines_and_captures_stderr() {
        let mut lines = Vec::new();
        let outcome = run_streaming(
            sh("echo one; echo two; echo oops >&2; exit 3"),
            &CancelToken::new(),
            Duration::from_millis(10),
            |l| lines.push(l.to_string()),
        )
        .unwrap();

        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(
            outcome,
            RunOutcome::Exited {
                code: 3,
                stderr: "oops\n".into()
            }
        );
    }

    #[test]
    fn pre_cancelled_token_never_spawns() {
        let token = CancelToken::new();
        token.cancel();
        let outcome = run_streaming(
            Command::new("/definitely/not/a/real/binary"),
            &token,
            Duration::from_millis(10),
            |_| {},
        )
        .unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled);
    }

    #[test]
    fn cancellation_kills_running_process() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let started = Instant::now();

        let outcome = run_streaming(
            sh("echo ready; exec sleep 30"),
            &token,
            Duration::from_millis(10),
            |line| {
                if line == "ready" {
                    trigger.cancel();
                }
            },
        )
        .unwrap();

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = run_streaming(
            Command::new("/definitely/not/a/real/binary"),
            &CancelToken::new(),
            Duration::from_millis(10),
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn captured_run_reports_exit_code() {
        let out = run_captured(sh("echo hi; exit 1")).unwrap();
        assert_eq!(out.code, 1);
        assert_eq!(out.stdout.trim(), "hi");
        assert!(!out.success());
    }
}
