//! CLI error types and exit codes.

use sshbook_core::{RepositoryError, SettingsError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - settings, validation, I/O or parse errors
    pub const GENERAL_ERROR: i32 = 1;
    /// The named host (or its stored password) does not exist
    pub const NOT_FOUND: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Settings or path resolution error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host or stored password not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Repository operation failed
    #[error("{0}")]
    Repository(String),

    /// Stored password error
    #[error("Secret error: {0}")]
    Secret(String),

    /// Output serialization error
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RepositoryError> for CliError {
    fn from(err: RepositoryError) -> Self {
        match err.root() {
            RepositoryError::NotFound(what) => Self::NotFound(what.clone()),
            RepositoryError::Authentication(_) | RepositoryError::Encryption(_) => {
                Self::Secret(err.to_string())
            }
            _ => Self::Repository(err.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error
    /// - 2: Host or stored password not found
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => exit_codes::NOT_FOUND,
            Self::Config(_)
            | Self::Repository(_)
            | Self::Secret(_)
            | Self::Output(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
