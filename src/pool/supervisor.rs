// src/pool/supervisor.rs

//! Worker process pool supervision: start, liveness, bounded teardown.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{ConfigFile, GroupConfig};
use crate::errors::{ProcherdError, Result};
use crate::pool::instance::{ExitCodeContract, ProcessStatus, WorkerInstance};

/// Runtime knobs for the pool, normally sourced from `[supervisor]` config.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Shared log sink every instance appends its stdout/stderr to.
    pub log_file: PathBuf,
    /// Maximum number of kill rounds before [`WorkerPool::kill_workers`]
    /// gives up.
    pub kill_max_rounds: u64,
    /// Sleep between kill rounds.
    pub kill_round_delay: Duration,
    /// Exit codes workers use to report their own state.
    pub exit_codes: ExitCodeContract,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("procherd-workers.log"),
            kill_max_rounds: 30,
            kill_round_delay: Duration::from_secs(1),
            exit_codes: ExitCodeContract::default(),
        }
    }
}

impl PoolSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            log_file: PathBuf::from(&cfg.supervisor.log_file),
            kill_max_rounds: cfg.supervisor.kill_max_rounds,
            kill_round_delay: Duration::from_millis(cfg.supervisor.kill_round_delay_ms),
            exit_codes: ExitCodeContract {
                dont_run: cfg.supervisor.dont_run_exit_code,
                sleeping: cfg.supervisor.sleeping_exit_code,
            },
        }
    }
}

/// One named worker group: its configuration plus the running instances.
#[derive(Debug)]
pub struct WorkerGroup {
    cfg: GroupConfig,
    instances: Vec<WorkerInstance>,
}

impl WorkerGroup {
    pub fn config(&self) -> &GroupConfig {
        &self.cfg
    }

    /// A group with no instances has not been started.
    pub fn instances(&self) -> &[WorkerInstance] {
        &self.instances
    }

    fn is_running(&mut self) -> bool {
        self.instances.iter_mut().any(|inst| inst.probe_alive())
    }
}

/// Supervises groups of long-running worker processes.
///
/// All state is exclusively owned here; between `start_workers` and
/// `kill_workers` nothing else mutates the groups.
pub struct WorkerPool {
    settings: PoolSettings,
    groups: BTreeMap<String, WorkerGroup>,
}

impl WorkerPool {
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            settings,
            groups: BTreeMap::new(),
        }
    }

    /// Build a pool from a validated config file and load its groups.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut pool = Self::new(PoolSettings::from_config(cfg));
        pool.load_groups(&cfg.group);
        pool
    }

    /// Populate groups from configuration.
    ///
    /// A no-op when groups are already loaded; call
    /// [`clear_runtime_cfg`](Self::clear_runtime_cfg) first to reload.
    pub fn load_groups(&mut self, groups: &BTreeMap<String, GroupConfig>) {
        if !self.groups.is_empty() {
            debug!("worker groups already loaded; keeping the current runtime configuration");
            return;
        }

        for (name, cfg) in groups {
            self.groups.insert(
                name.clone(),
                WorkerGroup {
                    cfg: cfg.clone(),
                    instances: Vec::new(),
                },
            );
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    pub fn groups(&self) -> &BTreeMap<String, WorkerGroup> {
        &self.groups
    }

    /// Start `count` instances for every configured group and return the
    /// updated group set.
    ///
    /// Every group must be idle before anything is spawned; the check runs
    /// across **all** groups first. A failed spawn tears the partial start
    /// down again, so no instance of a failed call is left behind.
    pub fn start_workers(&mut self) -> Result<&BTreeMap<String, WorkerGroup>> {
        if self.groups.is_empty() {
            return Err(ProcherdError::InvalidArgument(
                "can't start workers without any configuration".to_string(),
            ));
        }

        let running = self.running_groups();
        if !running.is_empty() {
            return Err(ProcherdError::WorkersRunningYet(format!(
                "can't start workers while group(s) [{}] have running instances",
                running.join(", ")
            )));
        }

        let mut spawn_err = None;
        'groups: for (name, group) in self.groups.iter_mut() {
            // Drop reaped instances from a previous cycle.
            group.instances.clear();

            for _ in 0..group.cfg.count {
                match WorkerInstance::spawn(
                    &group.cfg.path,
                    &group.cfg.args,
                    &self.settings.log_file,
                    self.settings.exit_codes,
                ) {
                    Ok(inst) => {
                        debug!(group = %name, pid = ?inst.pid(), "spawned worker instance");
                        group.instances.push(inst);
                    }
                    Err(err) => {
                        spawn_err = Some(err);
                        break 'groups;
                    }
                }
            }

            info!(
                group = %name,
                count = group.cfg.count,
                path = %group.cfg.path,
                "started worker group"
            );
        }

        if let Some(err) = spawn_err {
            warn!(error = %err, "start failed part-way; tearing spawned instances down again");
            self.abort_started_instances();
            return Err(err);
        }

        Ok(&self.groups)
    }

    /// True if any instance in the group currently probes alive.
    ///
    /// Probes are non-blocking; an unknown group name is simply not
    /// running.
    pub fn worker_is_running(&mut self, group_name: &str) -> bool {
        match self.groups.get_mut(group_name) {
            Some(group) => group.is_running(),
            None => false,
        }
    }

    /// Classify one instance of a group (see [`ProcessStatus`]).
    pub fn process_status(&mut self, group_name: &str, index: usize) -> Result<ProcessStatus> {
        let group = self.groups.get_mut(group_name).ok_or_else(|| {
            ProcherdError::InvalidArgument(format!("unknown worker group '{group_name}'"))
        })?;
        let inst = group.instances.get_mut(index).ok_or_else(|| {
            ProcherdError::InvalidArgument(format!(
                "group '{group_name}' has no instance #{index}"
            ))
        })?;
        Ok(inst.refresh_status())
    }

    /// Bounded-retry teardown of every instance across all groups.
    ///
    /// Each round probes every non-reaped instance once; an instance
    /// confirmed alive gets the hard kill when its last-known status was
    /// `Running`, a polite stop request otherwise. Rounds are separated by
    /// the configured delay and bounded by the configured maximum; on
    /// success every child has been reaped.
    pub async fn kill_workers(&mut self) -> Result<()> {
        let mut rounds: u64 = 0;

        loop {
            let any_alive = self.kill_round();

            if !any_alive {
                info!(rounds, "all worker instances stopped");
                return Ok(());
            }

            rounds += 1;
            if rounds > self.settings.kill_max_rounds {
                warn!(rounds, "giving up on worker teardown");
                return Err(ProcherdError::KillWorkersTimeout { rounds });
            }

            tokio::time::sleep(self.settings.kill_round_delay).await;
        }
    }

    /// Discard all group/instance state so configuration can be reloaded.
    pub fn clear_runtime_cfg(&mut self) -> Result<()> {
        let running = self.running_groups();
        if !running.is_empty() {
            return Err(ProcherdError::WorkersRunningYet(format!(
                "can't clear workers' runtime configuration while group(s) [{}] are running",
                running.join(", ")
            )));
        }

        self.groups.clear();
        Ok(())
    }

    /// One termination pass over every instance. Returns whether anything
    /// was still alive.
    fn kill_round(&mut self) -> bool {
        let mut any_alive = false;

        for (name, group) in self.groups.iter_mut() {
            for inst in group.instances.iter_mut() {
                let was_running = inst.last_status() == ProcessStatus::Running;
                if !inst.probe_alive() {
                    continue;
                }

                any_alive = true;
                // A process confirmed alive gets the hard kill at once:
                // bounded teardown beats graceful shutdown here.
                if was_running {
                    inst.force_kill();
                } else {
                    inst.request_stop();
                }
                debug!(
                    group = %name,
                    pid = ?inst.pid(),
                    forced = was_running,
                    "terminating worker instance"
                );
            }
        }

        any_alive
    }

    fn running_groups(&mut self) -> Vec<String> {
        self.groups
            .iter_mut()
            .filter_map(|(name, group)| group.is_running().then(|| name.clone()))
            .collect()
    }

    fn abort_started_instances(&mut self) {
        for group in self.groups.values_mut() {
            for inst in group.instances.iter_mut() {
                inst.force_kill();
            }
            // Dropping the handles lets the runtime reap the kills.
            group.instances.clear();
        }
    }
}
