// src/pool/instance.rs

//! One supervised worker process and its status bookkeeping.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::errors::Result;

/// Exit codes a worker uses to report its own state back to the supervisor.
///
/// Anything outside the contract classifies as [`ProcessStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodeContract {
    /// The worker decided it is configured not to run.
    pub dont_run: i32,
    /// The worker went to sleep instead of serving.
    pub sleeping: i32,
}

impl Default for ExitCodeContract {
    fn default() -> Self {
        Self {
            dont_run: 3,
            sleeping: 4,
        }
    }
}

/// Classification of one worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The OS reports the process alive.
    Running,
    /// Exited with the contracted "don't run" code.
    DontRun,
    /// Exited with the contracted "sleeping" code.
    Sleeping,
    /// Exited with an uncontracted code, was killed by a signal, or the
    /// status could not be determined.
    Unknown,
}

impl ProcessStatus {
    fn from_exit_code(code: Option<i32>, contract: &ExitCodeContract) -> Self {
        match code {
            Some(c) if c == contract.dont_run => Self::DontRun,
            Some(c) if c == contract.sleeping => Self::Sleeping,
            _ => Self::Unknown,
        }
    }
}

/// One spawned worker process: the handle plus what the supervisor knows
/// about it.
///
/// The handle is reaped at most once, by the probe that first observes the
/// exit; `kill_on_drop` backstops instances that are dropped while alive.
#[derive(Debug)]
pub struct WorkerInstance {
    child: Child,
    pid: Option<u32>,
    reaped: bool,
    exit_code: Option<i32>,
    last_status: ProcessStatus,
    contract: ExitCodeContract,
}

impl WorkerInstance {
    /// Spawn one instance of `path` with stdin attached to the null device
    /// and stdout/stderr appended to the shared log sink.
    pub fn spawn(
        path: &str,
        args: &[String],
        log_file: &Path,
        contract: ExitCodeContract,
    ) -> Result<Self> {
        let log_out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("opening worker log sink {log_file:?}"))?;
        let log_err = log_out
            .try_clone()
            .context("cloning worker log sink handle")?;

        let mut cmd = Command::new(path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_out))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning worker process '{path}'"))?;
        let pid = child.id();

        Ok(Self {
            child,
            pid,
            reaped: false,
            exit_code: None,
            last_status: ProcessStatus::Running,
            contract,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit code recorded when the instance was reaped; `None` while it is
    /// alive or when it was killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Status as of the most recent probe.
    pub fn last_status(&self) -> ProcessStatus {
        self.last_status
    }

    /// Non-blocking liveness probe. Records the exit code and reaps the
    /// handle the first time the child is observed dead.
    pub fn probe_alive(&mut self) -> bool {
        if self.reaped {
            return false;
        }

        match self.child.try_wait() {
            Ok(None) => {
                self.last_status = ProcessStatus::Running;
                true
            }
            Ok(Some(status)) => {
                self.reaped = true;
                self.exit_code = status.code();
                self.last_status = ProcessStatus::from_exit_code(self.exit_code, &self.contract);
                debug!(pid = ?self.pid, exit_code = ?self.exit_code, "reaped worker instance");
                false
            }
            Err(err) => {
                warn!(pid = ?self.pid, error = %err, "failed to probe worker process");
                self.last_status = ProcessStatus::Unknown;
                false
            }
        }
    }

    /// Probe and classify: `Running` while the OS reports the process
    /// alive, otherwise whatever the exit-code contract says.
    pub fn refresh_status(&mut self) -> ProcessStatus {
        self.probe_alive();
        self.last_status
    }

    /// Ask the process to exit (SIGTERM on unix; hard kill elsewhere).
    pub fn request_stop(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.pid {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            if let Err(err) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!(pid, error = %err, "SIGTERM failed; process is probably gone already");
            }
            return;
        }

        self.force_kill();
    }

    /// Unconditionally kill the process (SIGKILL / TerminateProcess).
    pub fn force_kill(&mut self) {
        if let Err(err) = self.child.start_kill() {
            debug!(pid = ?self.pid, error = %err, "force kill skipped; process already finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_classify_against_the_contract() {
        let contract = ExitCodeContract::default();

        assert_eq!(
            ProcessStatus::from_exit_code(Some(3), &contract),
            ProcessStatus::DontRun
        );
        assert_eq!(
            ProcessStatus::from_exit_code(Some(4), &contract),
            ProcessStatus::Sleeping
        );
        assert_eq!(
            ProcessStatus::from_exit_code(Some(0), &contract),
            ProcessStatus::Unknown
        );
        // Killed by a signal: no exit code at all.
        assert_eq!(
            ProcessStatus::from_exit_code(None, &contract),
            ProcessStatus::Unknown
        );
    }

    #[test]
    fn custom_contracts_shift_the_classification() {
        let contract = ExitCodeContract {
            dont_run: 64,
            sleeping: 75,
        };

        assert_eq!(
            ProcessStatus::from_exit_code(Some(64), &contract),
            ProcessStatus::DontRun
        );
        assert_eq!(
            ProcessStatus::from_exit_code(Some(75), &contract),
            ProcessStatus::Sleeping
        );
        assert_eq!(
            ProcessStatus::from_exit_code(Some(3), &contract),
            ProcessStatus::Unknown
        );
    }
}
