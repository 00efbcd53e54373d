// tests/config_validation.rs

//! Config model defaults and semantic validation.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;

use procherd::config::validate::validate_config;
use procherd::config::{ConfigFile, GroupConfig, SupervisorSection, load_and_validate, load_from_path};
use procherd::errors::ProcherdError;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("Procherd.toml");
    fs::write(&path, contents).expect("writing config fixture");
    path
}

fn group(path: &str, count: u32) -> GroupConfig {
    GroupConfig {
        path: path.to_string(),
        args: vec![],
        count,
    }
}

fn config_with(groups: Vec<(&str, GroupConfig)>) -> ConfigFile {
    let mut map = BTreeMap::new();
    for (name, cfg) in groups {
        map.insert(name.to_string(), cfg);
    }
    ConfigFile {
        supervisor: SupervisorSection::default(),
        group: map,
    }
}

#[test]
fn minimal_config_parses_with_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write_config(
        &dir,
        r#"
[group.resizer]
path = "workers/resizer"
"#,
    );

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.supervisor.log_file, "procherd-workers.log");
    assert_eq!(cfg.supervisor.kill_max_rounds, 30);
    assert_eq!(cfg.supervisor.kill_round_delay_ms, 1000);
    assert_eq!(cfg.supervisor.dont_run_exit_code, 3);
    assert_eq!(cfg.supervisor.sleeping_exit_code, 4);

    let resizer = cfg.group.get("resizer").expect("group must exist");
    assert_eq!(resizer.path, "workers/resizer");
    assert!(resizer.args.is_empty());
    assert_eq!(resizer.count, 1);
    Ok(())
}

#[test]
fn full_config_overrides_every_default() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write_config(
        &dir,
        r#"
[supervisor]
log_file = "/var/log/pool.log"
kill_max_rounds = 5
kill_round_delay_ms = 200
dont_run_exit_code = 64
sleeping_exit_code = 75

[group.mailer]
path = "workers/mailer"
args = ["--queue", "mail"]
count = 4
"#,
    );

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.supervisor.log_file, "/var/log/pool.log");
    assert_eq!(cfg.supervisor.kill_max_rounds, 5);
    assert_eq!(cfg.supervisor.kill_round_delay_ms, 200);
    assert_eq!(cfg.supervisor.dont_run_exit_code, 64);
    assert_eq!(cfg.supervisor.sleeping_exit_code, 75);

    let mailer = &cfg.group["mailer"];
    assert_eq!(mailer.args, vec!["--queue".to_string(), "mail".to_string()]);
    assert_eq!(mailer.count, 4);
    Ok(())
}

#[test]
fn broken_toml_is_a_load_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write_config(&dir, "[group.resizer\npath = ");

    assert!(load_from_path(&path).is_err());
    Ok(())
}

#[test]
fn a_config_without_groups_is_rejected() {
    let cfg = ConfigFile {
        supervisor: SupervisorSection::default(),
        group: BTreeMap::new(),
    };

    let err = validate_config(&cfg).unwrap_err();
    assert!(matches!(err, ProcherdError::ConfigError(_)));
    assert!(err.to_string().contains("[group"));
}

#[test]
fn zero_count_groups_are_rejected() {
    let cfg = config_with(vec![("resizer", group("workers/resizer", 0))]);

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("count"));
}

#[test]
fn blank_paths_are_rejected() {
    let cfg = config_with(vec![("resizer", group("   ", 1))]);

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("path"));
}

#[test]
fn zero_kill_budgets_are_rejected() {
    let mut cfg = config_with(vec![("resizer", group("workers/resizer", 1))]);
    cfg.supervisor.kill_max_rounds = 0;
    assert!(validate_config(&cfg).is_err());

    let mut cfg = config_with(vec![("resizer", group("workers/resizer", 1))]);
    cfg.supervisor.kill_round_delay_ms = 0;
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn colliding_exit_codes_are_rejected() {
    let mut cfg = config_with(vec![("resizer", group("workers/resizer", 1))]);
    cfg.supervisor.dont_run_exit_code = 7;
    cfg.supervisor.sleeping_exit_code = 7;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("must differ"));
}
