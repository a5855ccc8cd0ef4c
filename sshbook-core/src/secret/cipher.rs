//! AES-256-GCM sealing of stored secrets
//!
//! Envelope layout: `base64(nonce || ciphertext || tag)` with a 12 byte
//! random nonce and the standard base64 alphabet.
//!
//! The key is `SHA-256(<secret file path> || "sshbook-password-encryption-key")`.
//! Anyone who knows where the secret file lives can derive it, so the
//! envelope only protects against casual disclosure of the file contents,
//! not against an attacker with access to the account.
//!
//! The context string is part of the on-disk format: secret files written
//! with a different context cannot be opened, and changing [`KEY_CONTEXT`]
//! makes every existing file unreadable.

use std::fmt;
use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::error::{RepositoryError, RepositoryResult};

/// Application string mixed into the key derivation
pub const KEY_CONTEXT: &str = "sshbook-password-encryption-key";

/// Seals and opens secret envelopes with a key bound to a file path
#[derive(Clone)]
pub struct SecretCipher {
    key: Zeroizing<[u8; 32]>,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SecretCipher {
    /// Derives the cipher for the secret file at `path`
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let material = format!("{}{KEY_CONTEXT}", path.to_string_lossy());
        let hash = digest::digest(&digest::SHA256, material.as_bytes());
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(hash.as_ref());
        Self { key }
    }

    fn sealing_key(&self) -> RepositoryResult<LessSafeKey> {
        let unbound = UnboundKey::new(&AES_256_GCM, self.key.as_slice())
            .map_err(|_| RepositoryError::Encryption("Failed to create key".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypts `plaintext` under a fresh random nonce
    ///
    /// # Errors
    ///
    /// Returns `Encryption` if the random generator or the cipher fails.
    pub fn encrypt(&self, plaintext: &SecretString) -> RepositoryResult<String> {
        let key = self.sealing_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| RepositoryError::Encryption("Failed to generate nonce".to_string()))?;

        let mut buffer = Zeroizing::new(plaintext.expose_secret().as_bytes().to_vec());
        key.seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut *buffer,
        )
        .map_err(|_| RepositoryError::Encryption("Encryption failed".to_string()))?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + buffer.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&buffer);
        Ok(BASE64.encode(envelope))
    }

    /// Opens an envelope produced by [`SecretCipher::encrypt`]
    ///
    /// # Errors
    ///
    /// Returns `Authentication` if the envelope is not valid base64, is too
    /// short, or fails the integrity check.
    pub fn decrypt(&self, envelope: &str) -> RepositoryResult<SecretString> {
        let raw = BASE64.decode(envelope.trim()).map_err(|e| {
            RepositoryError::Authentication(format!("Envelope is not valid base64: {e}"))
        })?;
        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(RepositoryError::Authentication(
                "Envelope too short".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        let key = self.sealing_key()?;
        let mut buffer = Zeroizing::new(ciphertext.to_vec());
        let plaintext = key
            .open_in_place(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut *buffer)
            .map_err(|_| {
                RepositoryError::Authentication("Envelope failed integrity check".to_string())
            })?;

        let text = std::str::from_utf8(plaintext).map_err(|_| {
            RepositoryError::Authentication("Decrypted secret is not UTF-8".to_string())
        })?;
        Ok(SecretString::from(text.to_string()))
    }
}
