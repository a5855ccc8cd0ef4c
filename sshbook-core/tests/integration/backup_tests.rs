//! Backup rotation across repository saves

use sshbook_core::backup::{BackupManager, MAX_BACKUPS};
use sshbook_core::{HostDraft, HostRepository, RepositoryPaths};
use std::fs;
use tempfile::TempDir;

const ORIGINAL: &str = "Host seed\n    HostName seed.example.com\n";

#[test]
fn test_backup_bound_over_many_saves() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config");
    fs::write(&config, ORIGINAL).unwrap();
    let repo = HostRepository::new(RepositoryPaths::in_data_dir(
        &config,
        &dir.path().join("data"),
    ));

    for i in 0..(MAX_BACKUPS + 5) {
        repo.update(
            "seed",
            &HostDraft::new("seed").with_hostname(format!("host{i}.example.com")),
        )
        .unwrap();
    }

    let backups = repo.config_file().backups();
    let rolling = backups.rolling_backups(&config).unwrap();
    assert_eq!(rolling.len(), MAX_BACKUPS);

    // The newest backup holds the contents before the last save.
    let newest = fs::read_to_string(rolling.last().unwrap()).unwrap();
    assert!(newest.contains(&format!("host{}.example.com", MAX_BACKUPS + 3)));

    let pristine = BackupManager::pristine_path(&config);
    assert_eq!(fs::read_to_string(pristine).unwrap(), ORIGINAL);

    let backup_files = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".backup"))
        .count();
    assert_eq!(backup_files, MAX_BACKUPS + 1);
}

#[test]
fn test_no_backup_for_new_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("ssh").join("config");
    let repo = HostRepository::new(RepositoryPaths::in_data_dir(
        &config,
        &dir.path().join("data"),
    ));

    repo.add(&HostDraft::new("first")).unwrap();
    assert!(!BackupManager::pristine_path(&config).exists());
    assert!(repo
        .config_file()
        .backups()
        .rolling_backups(&config)
        .unwrap()
        .is_empty());

    repo.add(&HostDraft::new("second")).unwrap();
    assert_eq!(
        fs::read_to_string(BackupManager::pristine_path(&config)).unwrap(),
        "Host first\n    Port 22\n"
    );
}
