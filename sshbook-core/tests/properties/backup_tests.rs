//! Property-based tests for backup rotation

use proptest::prelude::*;
use sshbook_core::backup::{BackupManager, MAX_BACKUPS};
use sshbook_core::fs::{FileSystem, OWNER_ONLY};
use sshbook_core::MemoryFileSystem;
use std::path::Path;
use std::sync::Arc;

// Strategy for generating a sequence of file versions
fn arb_versions() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("Host [a-z]{1,8}\n", 1..(MAX_BACKUPS * 2 + 3))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    // Never more than the bound of rolling backups, and the pristine copy
    // always holds the first version
    #[test]
    fn prop_backup_bound(versions in arb_versions()) {
        let fs = Arc::new(MemoryFileSystem::new());
        let manager = BackupManager::new(fs.clone());
        let target = Path::new("/home/u/.ssh/config");
        fs.insert(target, versions[0].clone());

        for next in &versions[1..] {
            manager.ensure_backups(target);
            fs.write(target, next.as_bytes(), OWNER_ONLY).unwrap();
        }

        let saves = versions.len() - 1;
        let rolling = manager.rolling_backups(target).unwrap();
        prop_assert_eq!(rolling.len(), saves.min(MAX_BACKUPS));

        let pristine = fs.contents(&BackupManager::pristine_path(target));
        if saves == 0 {
            prop_assert!(pristine.is_none());
        } else {
            prop_assert_eq!(pristine, Some(versions[0].clone().into_bytes()));
        }

        // Oldest first, each holding the version it replaced.
        let expected = &versions[saves - rolling.len()..saves];
        for (backup, version) in rolling.iter().zip(expected) {
            prop_assert_eq!(fs.contents(backup), Some(version.clone().into_bytes()));
        }
    }
}
