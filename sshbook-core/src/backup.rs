//! Backups of the SSH config taken before every save
//!
//! Two kinds of backup live beside the live file:
//!
//! - the pristine backup `<name>.original.backup`, a copy of the file as it
//!   was before the first modification; it is never overwritten
//! - rolling backups `<name>-<YYYYmmddHHMMSSmmm>-sshbook.backup`, one per
//!   save, of which only the most recent [`MAX_BACKUPS`] are kept
//!
//! Backup failures are logged and never block the save they precede.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::atomic::atomic_write;
use crate::fs::{FileSystem, OWNER_ONLY, read_optional};

/// Number of rolling backups retained per file
pub const MAX_BACKUPS: usize = 10;

/// Suffix of rolling backup file names
pub const BACKUP_SUFFIX: &str = "-sshbook.backup";

/// Suffix appended to the file name for the pristine backup
pub const PRISTINE_SUFFIX: &str = ".original.backup";

const STAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Creates and prunes backups of a file
#[derive(Debug, Clone)]
pub struct BackupManager {
    fs: Arc<dyn FileSystem>,
    retention: usize,
}

impl BackupManager {
    /// Creates a manager keeping [`MAX_BACKUPS`] rolling backups
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            retention: MAX_BACKUPS,
        }
    }

    /// Overrides the number of rolling backups kept
    #[must_use]
    pub const fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    /// Path of the pristine backup for `target`
    #[must_use]
    pub fn pristine_path(target: &Path) -> PathBuf {
        target.with_file_name(format!("{}{PRISTINE_SUFFIX}", file_name(target)))
    }

    /// Rolling backups of `target`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be listed.
    pub fn rolling_backups(&self, target: &Path) -> std::io::Result<Vec<PathBuf>> {
        let Some(dir) = target.parent() else {
            return Ok(Vec::new());
        };
        let prefix = format!("{}-", file_name(target));
        let mut backups: Vec<PathBuf> = self
            .fs
            .list_dir(dir)?
            .into_iter()
            .filter(|p| stamp_of(p, &prefix).is_some())
            .collect();
        backups.sort();
        Ok(backups)
    }

    /// Backs up `target` before it is overwritten
    ///
    /// Creates the pristine backup if it is missing, writes a new rolling
    /// backup and prunes the oldest rolling backups beyond the retention
    /// bound. Nothing happens if `target` does not exist yet. Returns the
    /// path of the new rolling backup, if one was written.
    pub fn ensure_backups(&self, target: &Path) -> Option<PathBuf> {
        let contents = match read_optional(self.fs.as_ref(), target) {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                tracing::debug!(path = %target.display(), "No file to back up yet");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %target.display(), error = %e, "Failed to read file for backup");
                return None;
            }
        };

        self.ensure_pristine(target, &contents);
        let created = self.write_rolling(target, &contents);
        self.prune(target);
        created
    }

    fn ensure_pristine(&self, target: &Path, contents: &[u8]) {
        let pristine = Self::pristine_path(target);
        match self.fs.exists(&pristine) {
            Ok(true) => {}
            Ok(false) => match atomic_write(self.fs.as_ref(), &pristine, contents, OWNER_ONLY) {
                Ok(()) => tracing::info!(path = %pristine.display(), "Created pristine backup"),
                Err(e) => {
                    tracing::warn!(path = %pristine.display(), error = %e, "Failed to create pristine backup");
                }
            },
            Err(e) => {
                tracing::warn!(path = %pristine.display(), error = %e, "Failed to check pristine backup");
            }
        }
    }

    fn write_rolling(&self, target: &Path, contents: &[u8]) -> Option<PathBuf> {
        let prefix = format!("{}-", file_name(target));
        let latest = self
            .rolling_backups(target)
            .ok()
            .and_then(|backups| backups.last().and_then(|p| stamp_of(p, &prefix)));

        let mut millis = Utc::now().timestamp_millis();
        if let Some(latest) = latest {
            millis = millis.max(latest.and_utc().timestamp_millis() + 1);
        }
        let stamp = DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now);

        let backup = target.with_file_name(format!(
            "{prefix}{}{BACKUP_SUFFIX}",
            stamp.format(STAMP_FORMAT)
        ));
        match self.fs.write(&backup, contents, OWNER_ONLY) {
            Ok(()) => {
                tracing::debug!(path = %backup.display(), "Created backup");
                Some(backup)
            }
            Err(e) => {
                tracing::warn!(path = %backup.display(), error = %e, "Failed to create backup");
                None
            }
        }
    }

    fn prune(&self, target: &Path) {
        let backups = match self.rolling_backups(target) {
            Ok(backups) => backups,
            Err(e) => {
                tracing::warn!(path = %target.display(), error = %e, "Failed to list backups");
                return;
            }
        };
        let excess = backups.len().saturating_sub(self.retention);
        for old in &backups[..excess] {
            match self.fs.remove_file(old) {
                Ok(()) => tracing::debug!(path = %old.display(), "Removed old backup"),
                Err(e) => {
                    tracing::warn!(path = %old.display(), error = %e, "Failed to remove old backup");
                }
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Timestamp embedded in a rolling backup name, if `path` is one
fn stamp_of(path: &Path, prefix: &str) -> Option<NaiveDateTime> {
    let name = path.file_name()?.to_str()?;
    let stamp = name.strip_prefix(prefix)?.strip_suffix(BACKUP_SUFFIX)?;
    if stamp.len() != 17 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}
