//! Host repository over the SSH config and its sidecar stores
//!
//! [`HostRepository`] is the single entry point consumers use. Every call is
//! a self-contained transaction: the files it needs are read fresh, changed
//! in memory and written back. Nothing is cached between calls, so edits made
//! to the config by hand are always picked up.
//!
//! The SSH config is the source of truth. When a config change succeeds,
//! the matching metadata and secret updates are attempted on a best-effort
//! basis and reported in a [`MutationReport`] instead of failing the call.

mod config_file;
mod records;
mod report;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

pub use config_file::ConfigFile;
pub use report::{AuxiliaryOutcome, MutationReport};

use crate::config::RepositoryPaths;
use crate::error::{RepositoryError, RepositoryResult};
use crate::fs::{FileSystem, OsFileSystem};
use crate::metadata::{HostMetadata, MetadataMap, MetadataStore};
use crate::models::{HostDraft, HostRecord};
use crate::secret::SecretStore;
use crate::trace_operation;
use crate::tracing::span_names;

/// Operation names used when a config failure aborts a call
mod operation {
    pub const LIST: &str = "list hosts";
    pub const GET: &str = "look up host";
    pub const ADD: &str = "add host";
    pub const UPDATE: &str = "update host";
    pub const DELETE: &str = "delete host";
}

/// Repository of SSH hosts
#[derive(Debug, Clone)]
pub struct HostRepository {
    paths: RepositoryPaths,
    config: ConfigFile,
    metadata: MetadataStore,
    secrets: SecretStore,
}

impl HostRepository {
    /// Creates a repository on the real filesystem
    #[must_use]
    pub fn new(paths: RepositoryPaths) -> Self {
        Self::with_file_system(paths, Arc::new(OsFileSystem))
    }

    /// Creates a repository on the given filesystem
    #[must_use]
    pub fn with_file_system(paths: RepositoryPaths, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            config: ConfigFile::new(fs.clone(), &paths.ssh_config),
            metadata: MetadataStore::new(fs.clone(), &paths.metadata),
            secrets: SecretStore::new(fs, &paths.secrets),
            paths,
        }
    }

    /// Files this repository works on
    #[must_use]
    pub const fn paths(&self) -> &RepositoryPaths {
        &self.paths
    }

    /// The SSH config file handle
    #[must_use]
    pub const fn config_file(&self) -> &ConfigFile {
        &self.config
    }

    /// The metadata store
    #[must_use]
    pub const fn metadata_store(&self) -> &MetadataStore {
        &self.metadata
    }

    /// The secret store
    #[must_use]
    pub const fn secret_store(&self) -> &SecretStore {
        &self.secrets
    }

    /// Lists hosts whose hostname, user, tags or aliases contain `query`
    /// (case-insensitive); an empty query lists every host
    ///
    /// Unreadable metadata or secret files degrade to defaults with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the SSH config cannot be read or parsed.
    pub fn list(&self, query: &str) -> RepositoryResult<Vec<HostRecord>> {
        let _span = trace_operation!(span_names::REPOSITORY_LIST, query).entered();
        let document = self.config.load().map_err(|e| e.during(operation::LIST))?;

        let mut hosts = records::records_from_document(&document);
        let metadata = self.load_metadata_lenient();
        let secrets = match self.secrets.load_all() {
            Ok(secrets) => Some(secrets),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load secrets, reporting none");
                None
            }
        };
        records::merge(&mut hosts, &metadata, secrets.as_ref());

        hosts.retain(|host| host.matches(query));
        tracing::debug!(result_count = hosts.len(), "Listed hosts");
        Ok(hosts)
    }

    /// Returns the host with the given identity
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no host has that identity, or an error if the
    /// SSH config cannot be read or parsed.
    pub fn get(&self, identity: &str) -> RepositoryResult<HostRecord> {
        let _span = trace_operation!(span_names::REPOSITORY_GET, identity).entered();
        let document = self.config.load().map_err(|e| e.during(operation::GET))?;

        let mut host = document
            .find_block(identity)
            .and_then(records::record_from_block)
            .ok_or_else(|| RepositoryError::NotFound(identity.to_string()))?;

        let metadata = self.load_metadata_lenient();
        let secrets = self.secrets.load_all().ok();
        records::merge(std::slice::from_mut(&mut host), &metadata, secrets.as_ref());
        Ok(host)
    }

    /// Adds a new host
    ///
    /// The block is appended to the config with `HostName`, `User`, `Port`
    /// and `IdentityFile` lines. Any metadata left behind by an earlier host
    /// with the same identity is replaced by a fresh entry holding the
    /// draft's tags, and a leftover secret is dropped unless the draft
    /// supplies a new one.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an invalid draft, `AlreadyExists` if the
    /// identity is taken, or an error naming the operation if the config
    /// cannot be loaded or saved.
    pub fn add(&self, draft: &HostDraft) -> RepositoryResult<MutationReport> {
        let _span =
            trace_operation!(span_names::REPOSITORY_ADD, identity = %draft.identity).entered();
        draft.validate()?;

        let mut document = self.config.load().map_err(|e| e.during(operation::ADD))?;
        if document.contains(&draft.identity) {
            return Err(RepositoryError::AlreadyExists(draft.identity.clone()));
        }
        document.append_block(records::block_from_draft(draft));
        self.config
            .save(&document)
            .map_err(|e| e.during(operation::ADD))?;
        tracing::info!(identity = %draft.identity, "Added host");

        let secret = match non_empty(draft.secret.as_ref()) {
            Some(secret) => self.store_secret(&draft.identity, secret),
            None => AuxiliaryOutcome::from_result(
                "secret",
                &draft.identity,
                self.secrets.delete_secret(&draft.identity),
            ),
        };
        let metadata = AuxiliaryOutcome::from_result(
            "metadata",
            &draft.identity,
            self.metadata.reset(&draft.identity, &draft.tags),
        );

        Ok(MutationReport { metadata, secret })
    }

    /// Updates the host `identity` to match `draft`, renaming it if
    /// `draft.identity` differs
    ///
    /// A rename rewrites the matching pattern in the `Host` line and moves
    /// the metadata and secret entries to the new identity. `HostName` and
    /// `User` are updated when non-empty, the `IdentityFile` list is replaced
    /// as a whole and every other line is left as it was. The config is not
    /// rewritten when nothing in it changes.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an invalid draft, `NotFound` if `identity`
    /// does not exist (the existing identity itself is not validated, so
    /// hand-written patterns can still be updated), `AlreadyExists` if the new identity is taken, or an
    /// error naming the operation if the config cannot be loaded or saved.
    pub fn update(&self, identity: &str, draft: &HostDraft) -> RepositoryResult<MutationReport> {
        let _span = trace_operation!(
            span_names::REPOSITORY_UPDATE,
            identity,
            new_identity = %draft.identity
        )
        .entered();
        let renamed = draft.identity != identity;
        if renamed {
            draft.validate()?;
        } else {
            draft.validate_fields()?;
        }

        let mut document = self.config.load().map_err(|e| e.during(operation::UPDATE))?;
        if !document.contains(identity) {
            return Err(RepositoryError::NotFound(identity.to_string()));
        }
        if renamed && document.contains(&draft.identity) {
            return Err(RepositoryError::AlreadyExists(draft.identity.clone()));
        }

        let mut changed = false;
        if let Some(block) = document.find_block_mut(identity) {
            if renamed {
                changed |= block.rename_pattern(identity, &draft.identity);
            }
            changed |= records::apply_draft(block, draft);
        }

        if changed {
            self.config
                .save(&document)
                .map_err(|e| e.during(operation::UPDATE))?;
            tracing::info!(identity, new_identity = %draft.identity, "Updated host");
        } else {
            tracing::debug!(identity, "Config unchanged, not rewriting");
        }

        let mut secret = AuxiliaryOutcome::Skipped;
        if renamed {
            secret = AuxiliaryOutcome::from_result(
                "secret",
                &draft.identity,
                self.secrets.rename(identity, &draft.identity),
            );
        }
        if let Some(new_secret) = non_empty(draft.secret.as_ref()) {
            secret = secret.and(self.store_secret(&draft.identity, new_secret));
        }

        let metadata = AuxiliaryOutcome::from_result(
            "metadata",
            &draft.identity,
            self.metadata.update(&draft.identity, identity, &draft.tags),
        );

        Ok(MutationReport { metadata, secret })
    }

    /// Deletes the host `identity` together with its metadata and secret
    ///
    /// `identity` may be any pattern of the host; the sidecar entries removed
    /// are those of the host's identity.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the host does not exist, or an error naming the
    /// operation if the config cannot be loaded or saved.
    pub fn delete(&self, identity: &str) -> RepositoryResult<MutationReport> {
        let _span = trace_operation!(span_names::REPOSITORY_DELETE, identity).entered();

        let mut document = self.config.load().map_err(|e| e.during(operation::DELETE))?;
        let Some(removed) = document.remove_block(identity) else {
            return Err(RepositoryError::NotFound(identity.to_string()));
        };
        self.config
            .save(&document)
            .map_err(|e| e.during(operation::DELETE))?;
        let key = records::record_from_block(&removed)
            .map_or_else(|| identity.to_string(), |record| record.identity);
        tracing::info!(identity = %key, "Deleted host");

        let secret =
            AuxiliaryOutcome::from_result("secret", &key, self.secrets.delete_secret(&key));
        let metadata = AuxiliaryOutcome::from_result("metadata", &key, self.metadata.delete(&key));
        Ok(MutationReport { metadata, secret })
    }

    /// Pins or unpins a host
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata file cannot be loaded or saved.
    pub fn set_pinned(&self, identity: &str, pinned: bool) -> RepositoryResult<()> {
        let _span = trace_operation!(span_names::REPOSITORY_PIN, identity, pinned).entered();
        self.metadata.set_pinned(identity, pinned)
    }

    /// Records a use of a host, returning its updated metadata
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata file cannot be loaded or saved.
    pub fn record_use(&self, identity: &str) -> RepositoryResult<HostMetadata> {
        let _span = trace_operation!(span_names::REPOSITORY_RECORD_USE, identity).entered();
        self.metadata.record_use(identity)
    }

    /// Returns true if a secret is stored for `identity`
    ///
    /// # Errors
    ///
    /// Returns an error if the secret file cannot be read or parsed.
    pub fn has_secret(&self, identity: &str) -> RepositoryResult<bool> {
        self.secrets.has_secret(identity)
    }

    /// Returns the decrypted secret of `identity`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no secret is stored, `Authentication` if the
    /// stored envelope fails to open, or an error if the secret file cannot be
    /// read or parsed.
    pub fn get_decrypted_secret(&self, identity: &str) -> RepositoryResult<SecretString> {
        let _span = trace_operation!(span_names::REPOSITORY_SECRET, identity).entered();
        self.secrets.get_decrypted(identity)
    }

    fn load_metadata_lenient(&self) -> MetadataMap {
        self.metadata.load_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load metadata, using defaults");
            MetadataMap::new()
        })
    }

    fn store_secret(&self, identity: &str, secret: &SecretString) -> AuxiliaryOutcome {
        AuxiliaryOutcome::from_result("secret", identity, self.secrets.set_secret(identity, secret))
    }
}

fn non_empty(secret: Option<&SecretString>) -> Option<&SecretString> {
    secret.filter(|s| !s.expose_secret().is_empty())
}
