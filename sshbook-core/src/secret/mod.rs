//! Encrypted secret storage for `sshbook`
//!
//! Secrets (typically SSH passwords) are sealed with AES-256-GCM by
//! [`SecretCipher`] and kept in a JSON sidecar file managed by
//! [`SecretStore`]. Plaintexts are passed around as [`secrecy::SecretString`].

mod cipher;
mod store;

pub use cipher::{KEY_CONTEXT, SecretCipher};
pub use store::{SecretMap, SecretStore};
