//! Fixture builders for pool and config tests.

use std::collections::BTreeMap;
use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;
use std::time::Duration;

use procherd::config::{ConfigFile, GroupConfig, SupervisorSection};
use procherd::pool::PoolSettings;

/// Pool settings tuned for tests: tight kill budget, scratch log sink.
pub fn test_pool_settings(dir: &Path) -> PoolSettings {
    PoolSettings {
        log_file: dir.join("workers.log"),
        kill_max_rounds: 40,
        kill_round_delay: Duration::from_millis(50),
        exit_codes: Default::default(),
    }
}

/// Write an executable shell script into `dir` and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let contents = format!("#!/bin/sh\n{body}\n");
    fs::write(&path, contents).expect("writing test script");

    let mut perms = fs::metadata(&path)
        .expect("reading script metadata")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("marking script executable");

    path
}

/// One-group config map for pool tests. The group is named `workers`.
pub fn single_group(path: &Path, count: u32) -> BTreeMap<String, GroupConfig> {
    let mut groups = BTreeMap::new();
    groups.insert(
        "workers".to_string(),
        GroupConfig {
            path: path.display().to_string(),
            args: vec![],
            count,
        },
    );
    groups
}

/// A full config file with default supervisor settings.
pub fn config_with_groups(groups: BTreeMap<String, GroupConfig>) -> ConfigFile {
    ConfigFile {
        supervisor: SupervisorSection::default(),
        group: groups,
    }
}
