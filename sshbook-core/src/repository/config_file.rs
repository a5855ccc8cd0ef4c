//! Loading and saving the SSH config file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::atomic::atomic_write;
use crate::backup::BackupManager;
use crate::error::{RepositoryError, RepositoryResult};
use crate::fs::{FileSystem, OWNER_ONLY, read_optional};
use crate::ssh_config::ConfigDocument;
use crate::trace_operation;
use crate::tracing::span_names;

/// The SSH config file with its backups
#[derive(Debug, Clone)]
pub struct ConfigFile {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    backups: BackupManager,
}

impl ConfigFile {
    /// Creates a handle for the config at `path`
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            backups: BackupManager::new(fs.clone()),
            fs,
            path: path.into(),
        }
    }

    /// Path of the config file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Backup manager used before every save
    #[must_use]
    pub const fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Reads and parses the file; a missing file is an empty document
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read or `Parse` if it is malformed.
    pub fn load(&self) -> RepositoryResult<ConfigDocument> {
        let Some(bytes) = read_optional(self.fs.as_ref(), &self.path)
            .map_err(|e| RepositoryError::io("read", &self.path, e))?
        else {
            tracing::debug!(path = %self.path.display(), "SSH config does not exist yet");
            return Ok(ConfigDocument::default());
        };
        ConfigDocument::parse(&bytes).map_err(|source| RepositoryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Backs up the current file and atomically replaces it with `document`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the new contents cannot be written. Backup failures
    /// are only logged.
    pub fn save(&self, document: &ConfigDocument) -> RepositoryResult<()> {
        let _span = trace_operation!(span_names::CONFIG_SAVE, path = %self.path.display()).entered();
        self.backups.ensure_backups(&self.path);
        atomic_write(
            self.fs.as_ref(),
            &self.path,
            &document.to_bytes(),
            OWNER_ONLY,
        )?;
        tracing::info!(path = %self.path.display(), "Saved SSH config");
        Ok(())
    }
}
