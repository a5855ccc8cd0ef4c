//! Error types for `sshbook` core operations
//!
//! Every repository operation reports failures through [`RepositoryError`].
//! The variants follow the repository's failure taxonomy: identity lookups
//! (`NotFound`, `AlreadyExists`), malformed input (`Parse`, `Validation`),
//! filesystem failures (`Io`) and secret integrity failures (`Authentication`).

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ssh_config::ParseError;

/// Errors that can occur during repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No host with the given identity exists
    #[error("Host not found: {0}")]
    NotFound(String),

    /// A host with the given identity already exists
    #[error("Host already exists: {0}")]
    AlreadyExists(String),

    /// The SSH config file could not be parsed
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// Path of the file that failed to parse
        path: PathBuf,
        /// Underlying parse error with line information
        #[source]
        source: ParseError,
    },

    /// Filesystem failure on one of the managed files
    #[error("Failed to {operation} {}: {source}", path.display())]
    Io {
        /// Short description of the attempted filesystem operation
        operation: &'static str,
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A secret envelope failed its integrity check
    #[error("Secret authentication failed: {0}")]
    Authentication(String),

    /// Input rejected before any store was touched
    #[error("Validation failed for {field}: {reason}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Reason for the failure
        reason: String,
    },

    /// A sidecar store (metadata or secrets) could not be (de)serialized
    #[error("Serialization error in {}: {reason}", path.display())]
    Serialization {
        /// Path of the sidecar file
        path: PathBuf,
        /// Reason reported by the serializer
        reason: String,
    },

    /// Key setup or random number generation failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A config-store failure that aborted a repository operation
    #[error("Failed to {operation}: {source}")]
    Operation {
        /// Name of the repository operation that was aborted
        operation: &'static str,
        /// The failure that aborted it
        #[source]
        source: Box<RepositoryError>,
    },
}

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

impl RepositoryError {
    /// Creates an I/O error bound to the path it occurred on
    pub fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wraps this error with the name of the repository operation it aborted
    #[must_use]
    pub fn during(self, operation: &'static str) -> Self {
        Self::Operation {
            operation,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, unwrapping any operation context
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if this error (or its root) is `NotFound`
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound(_))
    }
}
