// src/exec/shell.rs

//! Bounded-time shell command execution with captured output.

use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::errors::{ProcherdError, Result};
use crate::exec::multiplex::{DrainOutcome, PipeDrain, drain_until_deadline};

/// Timeout applied when the caller doesn't pick one, in whole seconds.
pub const DEFAULT_TIMEOUT_SECS: i64 = 5;

/// Runs one shell command at a time and keeps its stdout, stderr and exit
/// code until the next call.
///
/// The captured state always reflects exactly the most recent invocation;
/// it is reset at the start of every call and never merged across calls.
#[derive(Debug, Default)]
pub struct ShellRunner {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: Option<i32>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured stdout of the last invocation.
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Captured stderr of the last invocation.
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Exit code of the last invocation, or `None` if no command has run to
    /// completion yet.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Run a shell command to completion and return its exit code.
    ///
    /// The command is rejected before anything is spawned if it is empty or
    /// blank. Stdout is read to end-of-stream, then stderr, then the child
    /// is reaped.
    ///
    /// Known limitation, kept on purpose: because stdout is drained to
    /// completion before stderr is touched, a child that fills the unread
    /// stderr pipe while still producing stdout can stall. Use
    /// [`run_with_timeout`](Self::run_with_timeout) for untrusted commands.
    pub async fn run(&mut self, command: &str) -> Result<i32> {
        validate_command(command)?;
        self.reset();

        info!(command = %command, "starting command");
        let mut child = spawn_shell(command)?;

        match self.drain_sequential(&mut child).await {
            Ok(code) => {
                self.exit_code = Some(code);
                info!(command = %command, exit_code = code, "command exited");
                Ok(code)
            }
            Err(err) => {
                // The child must not outlive a failed call.
                kill_and_reap(&mut child).await;
                Err(err)
            }
        }
    }

    /// Run a shell command under a wall-clock deadline of `timeout_secs`
    /// whole seconds and return its exit code.
    ///
    /// Both output pipes are drained through bounded polls until each
    /// reports end-of-stream or the deadline passes. On timeout the child
    /// is forcibly terminated and reaped, and the call fails with a timeout
    /// error naming the command; everything read before the deadline stays
    /// available through [`stdout`](Self::stdout) / [`stderr`](Self::stderr).
    pub async fn run_with_timeout(&mut self, command: &str, timeout_secs: i64) -> Result<i32> {
        validate_command(command)?;
        validate_timeout(timeout_secs)?;
        self.reset();

        let deadline = Instant::now() + Duration::from_secs(timeout_secs as u64);

        info!(command = %command, timeout_secs, "starting command with deadline");
        let mut child = spawn_shell(command)?;

        let (out_pipe, err_pipe) = match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => (out, err),
            _ => {
                kill_and_reap(&mut child).await;
                return Err(ProcherdError::Resource(
                    "child stdout/stderr pipe missing".to_string(),
                ));
            }
        };

        let mut stdout = PipeDrain::new(out_pipe);
        let mut stderr = PipeDrain::new(err_pipe);

        let drained = drain_until_deadline(&mut stdout, &mut stderr, deadline).await;

        // Whatever happens next, every byte read so far stays observable.
        self.stdout = stdout.into_bytes();
        self.stderr = stderr.into_bytes();

        match drained {
            Err(err) => {
                kill_and_reap(&mut child).await;
                Err(anyhow::Error::from(err)
                    .context(format!("draining output of command '{command}'"))
                    .into())
            }
            Ok(DrainOutcome::DeadlineExpired) => {
                warn!(command = %command, timeout_secs, "command execution timed out");
                kill_and_reap(&mut child).await;
                Err(ProcherdError::CommandTimeout {
                    command: command.to_string(),
                })
            }
            Ok(DrainOutcome::Completed) => {
                // Both pipes are closed, but a child that lingers without
                // exiting is still bounded by the same deadline.
                match timeout_at(deadline, child.wait()).await {
                    Ok(Ok(status)) => {
                        let code = status.code().unwrap_or(-1);
                        self.exit_code = Some(code);
                        info!(command = %command, exit_code = code, "command exited");
                        Ok(code)
                    }
                    Ok(Err(err)) => {
                        kill_and_reap(&mut child).await;
                        Err(anyhow::Error::from(err)
                            .context(format!("waiting for command '{command}'"))
                            .into())
                    }
                    Err(_elapsed) => {
                        warn!(command = %command, timeout_secs, "command closed its pipes but did not exit in time");
                        kill_and_reap(&mut child).await;
                        Err(ProcherdError::CommandTimeout {
                            command: command.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// [`run_with_timeout`](Self::run_with_timeout) with
    /// [`DEFAULT_TIMEOUT_SECS`].
    pub async fn run_with_default_timeout(&mut self, command: &str) -> Result<i32> {
        self.run_with_timeout(command, DEFAULT_TIMEOUT_SECS).await
    }

    fn reset(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
        self.exit_code = None;
    }

    /// Full sequential drain: stdout to end-of-stream, then stderr, then
    /// reap.
    async fn drain_sequential(&mut self, child: &mut Child) -> Result<i32> {
        let mut out_pipe = child
            .stdout
            .take()
            .ok_or_else(|| ProcherdError::Resource("child stdout pipe missing".to_string()))?;
        let mut err_pipe = child
            .stderr
            .take()
            .ok_or_else(|| ProcherdError::Resource("child stderr pipe missing".to_string()))?;

        out_pipe
            .read_to_end(&mut self.stdout)
            .await
            .context("reading child stdout")?;
        err_pipe
            .read_to_end(&mut self.stderr)
            .await
            .context("reading child stderr")?;

        let status = child.wait().await.context("waiting for child process")?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Build a shell command appropriate for the platform and spawn it with
/// stdin attached to the null device and both outputs piped.
fn spawn_shell(command: &str) -> Result<Child> {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .with_context(|| format!("spawning process for command '{command}'"))?;

    Ok(child)
}

/// Terminate and reap a child, on every exit path that isn't a normal wait.
async fn kill_and_reap(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        debug!(error = %err, "kill skipped; child already finished");
    }
    if let Err(err) = child.wait().await {
        warn!(error = %err, "failed to reap child process");
    }
}

fn validate_command(command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(ProcherdError::InvalidArgument(
            "can't execute an empty command".to_string(),
        ));
    }
    Ok(())
}

fn validate_timeout(timeout_secs: i64) -> Result<()> {
    if timeout_secs <= 0 {
        return Err(ProcherdError::InvalidArgument(format!(
            "timeout must be a positive number of whole seconds (got {timeout_secs})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_commands_are_rejected_before_spawning() {
        let mut shell = ShellRunner::new();

        for cmd in ["", "   ", "\t"] {
            let err = shell.run(cmd).await.unwrap_err();
            assert!(matches!(err, ProcherdError::InvalidArgument(_)));
        }

        // Nothing ran, so no result is observable.
        assert_eq!(shell.exit_code(), None);
        assert!(shell.stdout().is_empty());
    }

    #[tokio::test]
    async fn nonpositive_timeouts_are_rejected_before_spawning() {
        let mut shell = ShellRunner::new();

        for secs in [0, -1, i64::MIN] {
            let err = shell.run_with_timeout("echo hi", secs).await.unwrap_err();
            assert!(matches!(err, ProcherdError::InvalidArgument(_)));
        }

        assert_eq!(shell.exit_code(), None);
    }
}
