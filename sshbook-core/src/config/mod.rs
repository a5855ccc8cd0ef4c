//! Configuration for `sshbook`
//!
//! [`RepositoryPaths`] names the files a repository works on and is the only
//! configuration the repository itself needs. [`Settings`] is an optional
//! TOML file that front-ends use to resolve those paths and the log level.

mod paths;
mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use paths::{
    DATA_DIR_NAME, METADATA_FILE_NAME, RepositoryPaths, SECRETS_FILE_NAME, default_data_dir,
    default_ssh_config, expand_path,
};
pub use settings::{SETTINGS_FILE_NAME, Settings};

/// Errors from loading settings or resolving paths
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read
    #[error("Failed to read settings {}: {source}", path.display())]
    Io {
        /// Path of the settings file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has unknown keys
    #[error("Failed to parse settings: {0}")]
    Parse(String),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    /// A setting has an unusable value
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Settings key
        key: &'static str,
        /// Reason the value was rejected
        reason: String,
    },

    /// A default path was needed but there is no home directory
    #[error("Could not determine the home directory")]
    NoHomeDirectory,
}

/// Result type for settings operations
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
