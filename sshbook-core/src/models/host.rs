//! Host record and draft models

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, RepositoryResult};
use crate::metadata::HostMetadata;

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Characters that turn a `Host` pattern into a wildcard
pub const WILDCARD_CHARS: [char; 3] = ['*', '?', '!'];

/// Returns true if `pattern` is a wildcard or negated pattern
#[must_use]
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARD_CHARS)
}

/// A host as seen by consumers: config fields merged with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// First concrete pattern of the `Host` line
    pub identity: String,
    /// Every concrete pattern of the `Host` line, identity included
    pub aliases: Vec<String>,
    /// `HostName` value, empty if unset
    pub hostname: String,
    /// `User` value, empty if unset
    pub user: String,
    /// `Port` value
    pub port: u16,
    /// `IdentityFile` values in file order
    pub identity_files: Vec<String>,
    /// Tags from metadata
    pub tags: BTreeSet<String>,
    /// When the host was pinned
    pub pinned_at: Option<DateTime<Utc>>,
    /// Last recorded use
    pub last_used_at: Option<DateTime<Utc>>,
    /// Number of recorded uses
    pub use_count: u64,
    /// Whether an encrypted secret is stored for this host
    pub secret_present: bool,
}

impl HostRecord {
    /// Creates a record with default metadata
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            aliases: vec![identity.clone()],
            identity,
            hostname: String::new(),
            user: String::new(),
            port: DEFAULT_PORT,
            identity_files: Vec::new(),
            tags: BTreeSet::new(),
            pinned_at: None,
            last_used_at: None,
            use_count: 0,
            secret_present: false,
        }
    }

    /// Overlays metadata fields onto the record
    pub fn apply_metadata(&mut self, metadata: &HostMetadata) {
        self.tags.clone_from(&metadata.tags);
        self.pinned_at = metadata.pinned_at;
        self.last_used_at = metadata.last_used_at;
        self.use_count = metadata.use_count;
    }

    /// Returns true if the host is pinned
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        self.pinned_at.is_some()
    }

    /// Case-insensitive substring match on hostname, user, tags and aliases
    ///
    /// An empty query matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.hostname, &self.user]
            .into_iter()
            .chain(self.tags.iter())
            .chain(self.aliases.iter())
            .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Input for adding or updating a host
///
/// Carries the full desired state of the host. On update, `identity` may
/// differ from the current identity to rename the host.
#[derive(Debug)]
pub struct HostDraft {
    /// Identity (primary `Host` pattern)
    pub identity: String,
    /// `HostName`; not written when empty
    pub hostname: String,
    /// `User`; not written when empty
    pub user: String,
    /// `Port`
    pub port: u16,
    /// Complete list of `IdentityFile` values
    pub identity_files: Vec<String>,
    /// Complete tag set
    pub tags: BTreeSet<String>,
    /// New secret; `None` or an empty string leaves the stored secret alone
    pub secret: Option<SecretString>,
}

impl HostDraft {
    /// Creates a draft with only an identity and the default port
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            hostname: String::new(),
            user: String::new(),
            port: DEFAULT_PORT,
            identity_files: Vec::new(),
            tags: BTreeSet::new(),
            secret: None,
        }
    }

    /// Starts a draft from an existing record, without a secret
    #[must_use]
    pub fn from_record(record: &HostRecord) -> Self {
        Self {
            identity: record.identity.clone(),
            hostname: record.hostname.clone(),
            user: record.user.clone(),
            port: record.port,
            identity_files: record.identity_files.clone(),
            tags: record.tags.clone(),
            secret: None,
        }
    }

    /// Sets the identity
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Sets the hostname
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Sets the user
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Sets the port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Appends an identity file
    #[must_use]
    pub fn with_identity_file(mut self, path: impl Into<String>) -> Self {
        self.identity_files.push(path.into());
        self
    }

    /// Adds a tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Sets the secret to store
    #[must_use]
    pub fn with_secret(mut self, secret: SecretString) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Checks the draft before any file is touched
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the identity is empty, contains whitespace or
    /// wildcard characters, the port is zero, or a field contains a line
    /// break.
    pub fn validate(&self) -> RepositoryResult<()> {
        validate_identity(&self.identity)?;
        self.validate_fields()
    }

    /// Checks every field except the identity
    ///
    /// Used when the identity is an existing pattern that is kept as is.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the port is zero or a field contains a line
    /// break.
    pub fn validate_fields(&self) -> RepositoryResult<()> {
        if self.port == 0 {
            return Err(RepositoryError::validation("port", "must be between 1 and 65535"));
        }
        for (field, value) in [("hostname", &self.hostname), ("user", &self.user)] {
            if value.contains(['\n', '\r', '"']) {
                return Err(RepositoryError::validation(
                    field,
                    "must not contain line breaks or quotes",
                ));
            }
        }
        if self
            .identity_files
            .iter()
            .any(|f| f.trim().is_empty() || f.contains(['\n', '\r', '"']))
        {
            return Err(RepositoryError::validation(
                "identity_files",
                "entries must be non-empty and free of line breaks or quotes",
            ));
        }
        Ok(())
    }
}

/// Checks that `identity` can be used as a concrete `Host` pattern
///
/// # Errors
///
/// Returns `Validation` if the identity is empty or contains whitespace,
/// quotes or wildcard characters.
pub fn validate_identity(identity: &str) -> RepositoryResult<()> {
    if identity.is_empty() {
        return Err(RepositoryError::validation("identity", "must not be empty"));
    }
    if identity.chars().any(|c| c.is_whitespace() || c == '"') {
        return Err(RepositoryError::validation(
            "identity",
            "must not contain whitespace or quotes",
        ));
    }
    if is_wildcard(identity) {
        return Err(RepositoryError::validation(
            "identity",
            "must not contain wildcard characters (*, ?, !)",
        ));
    }
    Ok(())
}
