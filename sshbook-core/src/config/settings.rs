//! Optional user settings file (`settings.toml`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::{RepositoryPaths, default_data_dir, default_ssh_config, expand_path};
use super::{SettingsError, SettingsResult};
use crate::tracing::TracingLevel;

/// File name of the settings file inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// User settings
///
/// Every key is optional; missing keys fall back to the defaults under the
/// home directory. Paths may start with `~`.
///
/// ```toml
/// ssh_config = "~/.ssh/config"
/// data_dir = "~/.sshbook"
/// log_level = "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// SSH config file to manage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_config: Option<String>,
    /// Directory holding the metadata and secret files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Log level name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Settings {
    /// Default location of the settings file
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::NoHomeDirectory` if the home directory cannot
    /// be determined.
    pub fn default_path() -> SettingsResult<PathBuf> {
        Ok(default_data_dir()?.join(SETTINGS_FILE_NAME))
    }

    /// Loads settings from `path`; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Io` if the file exists but cannot be read, or
    /// `SettingsError::Parse` if it is not valid settings TOML.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses settings from TOML text
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Parse` on invalid TOML or unknown keys.
    pub fn from_toml(text: &str) -> SettingsResult<Self> {
        toml::from_str(text).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Serializes settings to TOML text
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Serialize` if serialization fails.
    pub fn to_toml(&self) -> SettingsResult<String> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))
    }

    /// Configured log level, if any
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` for an unknown level name.
    pub fn log_level(&self) -> SettingsResult<Option<TracingLevel>> {
        self.log_level
            .as_deref()
            .map(|level| {
                level.parse().map_err(|e: crate::tracing::TracingError| {
                    SettingsError::InvalidValue {
                        key: "log_level",
                        reason: e.to_string(),
                    }
                })
            })
            .transpose()
    }

    /// Resolves repository paths
    ///
    /// Explicit overrides (command line, environment) win over the settings
    /// file, which wins over the defaults under the home directory.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::NoHomeDirectory` if a default is needed and the
    /// home directory cannot be determined.
    pub fn resolve_paths(
        &self,
        ssh_config: Option<&Path>,
        data_dir: Option<&Path>,
    ) -> SettingsResult<RepositoryPaths> {
        let ssh_config = match (ssh_config, self.ssh_config.as_deref()) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(configured)) => expand_path(configured),
            (None, None) => default_ssh_config()?,
        };
        let data_dir = match (data_dir, self.data_dir.as_deref()) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(configured)) => expand_path(configured),
            (None, None) => default_data_dir()?,
        };
        Ok(RepositoryPaths::in_data_dir(ssh_config, &data_dir))
    }
}
