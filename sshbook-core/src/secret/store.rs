//! JSON-file backed store of encrypted host secrets

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use super::SecretCipher;
use crate::atomic::atomic_write;
use crate::error::{RepositoryError, RepositoryResult};
use crate::fs::{FileSystem, OWNER_ONLY, read_optional};

/// Identity to envelope mapping as stored on disk
pub type SecretMap = BTreeMap<String, String>;

/// Stores at most one encrypted secret per host identity
#[derive(Debug, Clone)]
pub struct SecretStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    cipher: SecretCipher,
}

impl SecretStore {
    /// Creates a store backed by `path`, deriving its cipher from the path
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cipher = SecretCipher::for_path(&path);
        Self { fs, path, cipher }
    }

    /// Path of the secret file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cipher bound to this store
    #[must_use]
    pub const fn cipher(&self) -> &SecretCipher {
        &self.cipher
    }

    /// Loads every envelope; a missing or empty file yields an empty mapping
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read or `Serialization` if it is not
    /// a JSON object of strings.
    pub fn load_all(&self) -> RepositoryResult<SecretMap> {
        let bytes = read_optional(self.fs.as_ref(), &self.path)
            .map_err(|e| RepositoryError::io("read", &self.path, e))?;
        match bytes {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Serialization {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
            _ => Ok(SecretMap::new()),
        }
    }

    /// Replaces the file with `secrets`
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `Io` if the mapping cannot be written.
    pub fn save_all(&self, secrets: &SecretMap) -> RepositoryResult<()> {
        let json =
            serde_json::to_vec_pretty(secrets).map_err(|e| RepositoryError::Serialization {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        atomic_write(self.fs.as_ref(), &self.path, &json, OWNER_ONLY)
    }

    /// Encrypts and stores `plaintext` for `identity`
    ///
    /// An empty plaintext is ignored and `false` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved, or if
    /// encryption fails.
    pub fn set_secret(&self, identity: &str, plaintext: &SecretString) -> RepositoryResult<bool> {
        if plaintext.expose_secret().is_empty() {
            tracing::debug!(identity, "Ignoring empty secret");
            return Ok(false);
        }
        let mut secrets = self.load_all()?;
        let envelope = self.cipher.encrypt(plaintext)?;
        secrets.insert(identity.to_string(), envelope);
        self.save_all(&secrets)?;
        tracing::debug!(identity, "Stored secret");
        Ok(true)
    }

    /// Returns the stored envelope for `identity`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no secret is stored, or a load error.
    pub fn get_secret(&self, identity: &str) -> RepositoryResult<String> {
        self.load_all()?
            .remove(identity)
            .ok_or_else(|| RepositoryError::NotFound(format!("secret for {identity}")))
    }

    /// Returns the decrypted secret for `identity`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no secret is stored, `Authentication` if the
    /// envelope fails to open, or a load error.
    pub fn get_decrypted(&self, identity: &str) -> RepositoryResult<SecretString> {
        let envelope = self.get_secret(identity)?;
        self.cipher.decrypt(&envelope)
    }

    /// Returns true if a secret is stored for `identity`
    ///
    /// # Errors
    ///
    /// Returns any error other than `NotFound`.
    pub fn has_secret(&self, identity: &str) -> RepositoryResult<bool> {
        match self.get_secret(identity) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Removes the secret of `identity`
    ///
    /// Returns false, without touching the file, if none was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved.
    pub fn delete_secret(&self, identity: &str) -> RepositoryResult<bool> {
        let mut secrets = self.load_all()?;
        if secrets.remove(identity).is_none() {
            return Ok(false);
        }
        self.save_all(&secrets)?;
        tracing::debug!(identity, "Deleted secret");
        Ok(true)
    }

    /// Moves the secret of `old` to `new`
    ///
    /// The envelope is moved as is; the key does not depend on the identity.
    /// Returns false, without touching the file, if `old` had no secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or saved.
    pub fn rename(&self, old: &str, new: &str) -> RepositoryResult<bool> {
        let mut secrets = self.load_all()?;
        let Some(envelope) = secrets.remove(old) else {
            return Ok(false);
        };
        secrets.insert(new.to_string(), envelope);
        self.save_all(&secrets)?;
        tracing::debug!(old, new, "Moved secret");
        Ok(true)
    }
}
