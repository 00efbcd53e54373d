// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [supervisor]
/// log_file = "procherd-workers.log"
/// kill_max_rounds = 30
/// kill_round_delay_ms = 1000
///
/// [group.resizer]
/// path = "workers/resizer"
/// args = ["--queue", "resize"]
/// count = 3
/// ```
///
/// The `[supervisor]` section is optional and has reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Supervisor behaviour config from `[supervisor]`.
    #[serde(default)]
    pub supervisor: SupervisorSection,

    /// All worker groups from `[group.<name>]`.
    ///
    /// Keys are the *group names* (e.g. `"resizer"`, `"mailer"`).
    #[serde(default)]
    pub group: BTreeMap<String, GroupConfig>,
}

/// `[supervisor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSection {
    /// Shared log sink every worker instance appends its stdout/stderr to.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Maximum number of kill rounds before `kill_workers` gives up.
    #[serde(default = "default_kill_max_rounds")]
    pub kill_max_rounds: u64,

    /// Sleep between kill rounds, in milliseconds.
    #[serde(default = "default_kill_round_delay_ms")]
    pub kill_round_delay_ms: u64,

    /// Exit code a worker uses to report "configured not to run".
    #[serde(default = "default_dont_run_exit_code")]
    pub dont_run_exit_code: i32,

    /// Exit code a worker uses to report "went to sleep".
    #[serde(default = "default_sleeping_exit_code")]
    pub sleeping_exit_code: i32,
}

fn default_log_file() -> String {
    "procherd-workers.log".to_string()
}

fn default_kill_max_rounds() -> u64 {
    30
}

fn default_kill_round_delay_ms() -> u64 {
    1000
}

fn default_dont_run_exit_code() -> i32 {
    3
}

fn default_sleeping_exit_code() -> i32 {
    4
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            kill_max_rounds: default_kill_max_rounds(),
            kill_round_delay_ms: default_kill_round_delay_ms(),
            dont_run_exit_code: default_dont_run_exit_code(),
            sleeping_exit_code: default_sleeping_exit_code(),
        }
    }
}

/// `[group.<name>]` section: one worker executable and how many instances
/// of it should run.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    /// Path of the worker executable.
    pub path: String,

    /// Arguments passed to every instance.
    #[serde(default)]
    pub args: Vec<String>,

    /// Desired number of concurrently running instances.
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}
