//! Property-based tests for secret envelopes and the secret store

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use proptest::prelude::*;
use secrecy::{ExposeSecret, SecretString};
use sshbook_core::{MemoryFileSystem, RepositoryError, SecretCipher, SecretStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Strategy for generating secret plaintexts, including non-ASCII text
fn arb_plaintext() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9!@#$%^&*()_+=-]{1,64}".prop_map(|s| s),
        "\\PC{1,32}".prop_map(|s| s),
    ]
}

// Strategy for generating secret file locations
fn arb_store_path() -> impl Strategy<Value = PathBuf> {
    "/home/[a-z]{1,8}/\\.sshbook".prop_map(|dir| Path::new(&dir).join("passwords.json"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Sealing then opening with the same path yields the plaintext
    #[test]
    fn prop_envelope_round_trip(path in arb_store_path(), plaintext in arb_plaintext()) {
        let cipher = SecretCipher::for_path(&path);
        let envelope = cipher.encrypt(&SecretString::from(plaintext.clone())).unwrap();
        let opened = cipher.decrypt(&envelope).unwrap();
        prop_assert_eq!(opened.expose_secret(), plaintext.as_str());
    }

    // Every sealing uses a fresh nonce
    #[test]
    fn prop_envelopes_are_not_reused(plaintext in arb_plaintext()) {
        let cipher = SecretCipher::for_path(Path::new("/h/.sshbook/passwords.json"));
        let secret = SecretString::from(plaintext);
        let a = cipher.encrypt(&secret).unwrap();
        let b = cipher.encrypt(&secret).unwrap();
        prop_assert_ne!(a, b);
    }

    // Flipping any bit of the envelope is detected
    #[test]
    fn prop_tampering_is_detected(
        plaintext in arb_plaintext(),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let cipher = SecretCipher::for_path(Path::new("/h/.sshbook/passwords.json"));
        let envelope = cipher.encrypt(&SecretString::from(plaintext)).unwrap();

        let mut raw = BASE64.decode(&envelope).unwrap();
        let index = position.index(raw.len());
        raw[index] ^= 1 << bit;
        let tampered = BASE64.encode(raw);

        let result = cipher.decrypt(&tampered);
        prop_assert!(matches!(result, Err(RepositoryError::Authentication(_))));
    }

    // An envelope is bound to the path it was sealed for
    #[test]
    fn prop_other_path_cannot_open(
        a in arb_store_path(),
        b in arb_store_path(),
        plaintext in arb_plaintext(),
    ) {
        prop_assume!(a != b);
        let envelope = SecretCipher::for_path(&a)
            .encrypt(&SecretString::from(plaintext))
            .unwrap();
        let result = SecretCipher::for_path(&b).decrypt(&envelope);
        prop_assert!(matches!(result, Err(RepositoryError::Authentication(_))));
    }

    // Store operations keep exactly the identities that were set and not deleted
    #[test]
    fn prop_store_tracks_identities(
        entries in prop::collection::btree_map("[a-z][a-z0-9-]{0,10}", arb_plaintext(), 0..8),
        removed in prop::collection::btree_set("[a-z][a-z0-9-]{0,10}", 0..4),
    ) {
        let fs = Arc::new(MemoryFileSystem::new());
        let store = SecretStore::new(fs, "/h/.sshbook/passwords.json");

        for (identity, plaintext) in &entries {
            prop_assert!(store.set_secret(identity, &SecretString::from(plaintext.clone())).unwrap());
        }
        for identity in &removed {
            let existed = store.delete_secret(identity).unwrap();
            prop_assert_eq!(existed, entries.contains_key(identity));
        }

        for (identity, plaintext) in &entries {
            let kept = !removed.contains(identity);
            prop_assert_eq!(store.has_secret(identity).unwrap(), kept);
            if kept {
                let opened = store.get_decrypted(identity).unwrap();
                prop_assert_eq!(opened.expose_secret(), plaintext.as_str());
            }
        }
    }
}
