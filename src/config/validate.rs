// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{ProcherdError, Result};

pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_groups(cfg)?;
    validate_supervisor(cfg)?;
    validate_groups(cfg)?;
    Ok(())
}

fn ensure_has_groups(cfg: &ConfigFile) -> Result<()> {
    if cfg.group.is_empty() {
        return Err(ProcherdError::ConfigError(
            "config must contain at least one [group.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_supervisor(cfg: &ConfigFile) -> Result<()> {
    if cfg.supervisor.kill_max_rounds == 0 {
        return Err(ProcherdError::ConfigError(
            "[supervisor].kill_max_rounds must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.supervisor.kill_round_delay_ms == 0 {
        return Err(ProcherdError::ConfigError(
            "[supervisor].kill_round_delay_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.supervisor.log_file.trim().is_empty() {
        return Err(ProcherdError::ConfigError(
            "[supervisor].log_file must not be empty".to_string(),
        ));
    }

    if cfg.supervisor.dont_run_exit_code == cfg.supervisor.sleeping_exit_code {
        return Err(ProcherdError::ConfigError(format!(
            "[supervisor] dont_run_exit_code and sleeping_exit_code must differ (both {})",
            cfg.supervisor.dont_run_exit_code
        )));
    }

    Ok(())
}

fn validate_groups(cfg: &ConfigFile) -> Result<()> {
    for (name, group) in cfg.group.iter() {
        if group.path.trim().is_empty() {
            return Err(ProcherdError::ConfigError(format!(
                "group '{}' has an empty `path`",
                name
            )));
        }
        if group.count == 0 {
            return Err(ProcherdError::ConfigError(format!(
                "group '{}' must have `count` >= 1 (got 0)",
                name
            )));
        }
    }
    Ok(())
}
