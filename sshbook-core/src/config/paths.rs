//! Locations of the files a repository works on

use std::path::{Path, PathBuf};

use super::{SettingsError, SettingsResult};

/// Name of the secret file, kept beside the metadata file
pub const SECRETS_FILE_NAME: &str = "passwords.json";

/// Name of the metadata file inside the data directory
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Name of the data directory under the home directory
pub const DATA_DIR_NAME: &str = ".sshbook";

/// The three files backing a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPaths {
    /// SSH client config (`~/.ssh/config`)
    pub ssh_config: PathBuf,
    /// Metadata sidecar
    pub metadata: PathBuf,
    /// Encrypted secret sidecar
    pub secrets: PathBuf,
}

impl RepositoryPaths {
    /// Uses `metadata` as given and places the secret file beside it
    #[must_use]
    pub fn new(ssh_config: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        let metadata = metadata.into();
        let secrets = metadata
            .parent()
            .map_or_else(|| PathBuf::from(SECRETS_FILE_NAME), |dir| dir.join(SECRETS_FILE_NAME));
        Self {
            ssh_config: ssh_config.into(),
            metadata,
            secrets,
        }
    }

    /// Keeps both sidecar files in `data_dir`
    #[must_use]
    pub fn in_data_dir(ssh_config: impl Into<PathBuf>, data_dir: &Path) -> Self {
        Self::new(ssh_config, data_dir.join(METADATA_FILE_NAME))
    }

    /// `~/.ssh/config` with sidecars in `~/.sshbook`
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::NoHomeDirectory` if the home directory cannot
    /// be determined.
    pub fn from_home() -> SettingsResult<Self> {
        Ok(Self::in_data_dir(default_ssh_config()?, &default_data_dir()?))
    }
}

/// Default SSH config location
///
/// # Errors
///
/// Returns `SettingsError::NoHomeDirectory` if the home directory cannot be
/// determined.
pub fn default_ssh_config() -> SettingsResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".ssh").join("config"))
        .ok_or(SettingsError::NoHomeDirectory)
}

/// Default data directory for the sidecar files
///
/// # Errors
///
/// Returns `SettingsError::NoHomeDirectory` if the home directory cannot be
/// determined.
pub fn default_data_dir() -> SettingsResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or(SettingsError::NoHomeDirectory)
}

/// Expands a leading `~` in a user-supplied path
#[must_use]
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
