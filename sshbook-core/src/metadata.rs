//! Sidecar store for per-host metadata
//!
//! Tags, pin state and usage counters are kept in a JSON file separate from
//! the SSH config, keyed by host identity. Every operation loads the whole
//! mapping, changes one entry and writes the whole mapping back atomically.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::atomic::atomic_write;
use crate::error::{RepositoryError, RepositoryResult};
use crate::fs::{FileSystem, OWNER_ONLY, read_optional};

/// Metadata kept for one host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMetadata {
    /// Free-form labels
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// When the host was pinned, if it is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<DateTime<Utc>>,
    /// Last recorded use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Number of recorded uses
    #[serde(default)]
    pub use_count: u64,
}

/// Identity to metadata mapping as stored on disk
pub type MetadataMap = BTreeMap<String, HostMetadata>;

/// JSON-file backed metadata store
#[derive(Debug, Clone)]
pub struct MetadataStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl MetadataStore {
    /// Creates a store backed by `path`
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    /// Path of the metadata file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every entry; a missing or empty file yields an empty mapping
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read or `Serialization` if it is not
    /// valid metadata JSON.
    pub fn load_all(&self) -> RepositoryResult<MetadataMap> {
        let bytes = read_optional(self.fs.as_ref(), &self.path)
            .map_err(|e| RepositoryError::io("read", &self.path, e))?;
        match bytes {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Serialization {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
            _ => Ok(MetadataMap::new()),
        }
    }

    /// Replaces the file with `entries`
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `Io` if the mapping cannot be written.
    pub fn save_all(&self, entries: &MetadataMap) -> RepositoryResult<()> {
        let json =
            serde_json::to_vec_pretty(entries).map_err(|e| RepositoryError::Serialization {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        atomic_write(self.fs.as_ref(), &self.path, &json, OWNER_ONLY)
    }

    /// Returns the entry for `identity`, if any
    ///
    /// # Errors
    ///
    /// Propagates errors from [`MetadataStore::load_all`].
    pub fn get(&self, identity: &str) -> RepositoryResult<Option<HostMetadata>> {
        Ok(self.load_all()?.remove(identity))
    }

    /// Pins or unpins a host, creating its entry if needed
    ///
    /// Pinning an already pinned host keeps the original timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved.
    pub fn set_pinned(&self, identity: &str, pinned: bool) -> RepositoryResult<()> {
        self.modify(|entries| {
            let entry = entries.entry(identity.to_string()).or_default();
            entry.pinned_at = match (pinned, entry.pinned_at) {
                (true, Some(at)) => Some(at),
                (true, None) => Some(Utc::now()),
                (false, _) => None,
            };
            true
        })?;
        tracing::debug!(identity, pinned, "Updated pin state");
        Ok(())
    }

    /// Records a use of a host and returns the updated entry
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved.
    pub fn record_use(&self, identity: &str) -> RepositoryResult<HostMetadata> {
        let mut updated = HostMetadata::default();
        self.modify(|entries| {
            let entry = entries.entry(identity.to_string()).or_default();
            entry.use_count = entry.use_count.saturating_add(1);
            entry.last_used_at = Some(Utc::now());
            updated = entry.clone();
            true
        })?;
        tracing::debug!(identity, use_count = updated.use_count, "Recorded host use");
        Ok(updated)
    }

    /// Replaces the entry for `identity` with a fresh one carrying `tags`
    ///
    /// Always writes the file, so the result is true on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved.
    pub fn reset(&self, identity: &str, tags: &BTreeSet<String>) -> RepositoryResult<bool> {
        self.modify(|entries| {
            entries.insert(
                identity.to_string(),
                HostMetadata {
                    tags: tags.clone(),
                    ..HostMetadata::default()
                },
            );
            true
        })
    }

    /// Stores `tags` for `identity`, first moving the entry of `previous`
    /// over when the identity changed
    ///
    /// Pin state and counters of the previous entry are carried over.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved.
    pub fn update(
        &self,
        identity: &str,
        previous: &str,
        tags: &BTreeSet<String>,
    ) -> RepositoryResult<bool> {
        self.modify(|entries| {
            let mut entry = if previous == identity {
                entries.remove(identity).unwrap_or_default()
            } else {
                entries
                    .remove(previous)
                    .or_else(|| entries.remove(identity))
                    .unwrap_or_default()
            };
            entry.tags.clone_from(tags);
            entries.insert(identity.to_string(), entry);
            true
        })
    }

    /// Moves the entry of `old` to `new`
    ///
    /// Returns false, without touching the file, if `old` has no entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved.
    pub fn rename(&self, old: &str, new: &str) -> RepositoryResult<bool> {
        self.modify(|entries| match entries.remove(old) {
            Some(entry) => {
                entries.insert(new.to_string(), entry);
                true
            }
            None => false,
        })
    }

    /// Removes the entry for `identity`
    ///
    /// Returns false, without touching the file, if there was no entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved.
    pub fn delete(&self, identity: &str) -> RepositoryResult<bool> {
        self.modify(|entries| entries.remove(identity).is_some())
    }

    /// Loads the mapping, applies `change` and saves it if `change` reports
    /// a modification
    fn modify<F>(&self, change: F) -> RepositoryResult<bool>
    where
        F: FnOnce(&mut MetadataMap) -> bool,
    {
        let mut entries = self.load_all()?;
        let changed = change(&mut entries);
        if changed {
            self.save_all(&entries)?;
        }
        Ok(changed)
    }
}
