//! End-to-end repository scenario on a real directory

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use secrecy::{ExposeSecret, SecretString};
use sshbook_core::{AuxiliaryOutcome, HostDraft, HostRepository, RepositoryError, RepositoryPaths};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HAND_WRITTEN: &str = "\
# Managed partly by hand
Host *
    ServerAliveInterval 60

Host bastion
    HostName bastion.example.com
    User jump
    ForwardAgent yes   # needed for deploys
";

fn repository(dir: &Path) -> HostRepository {
    let paths = RepositoryPaths::in_data_dir(dir.join(".ssh/config"), &dir.join(".sshbook"));
    HostRepository::new(paths)
}

fn config_text(repo: &HostRepository) -> String {
    fs::read_to_string(&repo.paths().ssh_config).expect("config should exist")
}

#[test]
fn test_db1_lifecycle() {
    let dir = TempDir::new().unwrap();
    let repo = repository(dir.path());
    fs::create_dir_all(dir.path().join(".ssh")).unwrap();
    fs::write(&repo.paths().ssh_config, HAND_WRITTEN).unwrap();

    // Add with a secret.
    let report = repo
        .add(
            &HostDraft::new("db1")
                .with_hostname("10.0.0.5")
                .with_user("root")
                .with_tag("db")
                .with_secret(SecretString::from("s3cret")),
        )
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.secret, AuxiliaryOutcome::Applied);
    assert!(config_text(&repo).starts_with(HAND_WRITTEN));

    // List with merged metadata and secret presence.
    let hosts = repo.list("").unwrap();
    let identities: Vec<&str> = hosts.iter().map(|h| h.identity.as_str()).collect();
    assert_eq!(identities, vec!["bastion", "db1"]);
    let db1 = &hosts[1];
    assert!(db1.secret_present);
    assert!(db1.tags.contains("db"));
    assert!(db1.pinned_at.is_none());
    assert_eq!(db1.use_count, 0);
    assert!(!hosts[0].secret_present);

    // Decrypt.
    assert_eq!(
        repo.get_decrypted_secret("db1").unwrap().expose_secret(),
        "s3cret"
    );

    // Pin and use, then rename: both sidecars follow the host.
    repo.set_pinned("db1", true).unwrap();
    repo.record_use("db1").unwrap();
    repo.record_use("db1").unwrap();

    let current = repo.get("db1").unwrap();
    let report = repo
        .update("db1", &HostDraft::from_record(&current).with_identity("db1-prod"))
        .unwrap();
    assert!(report.is_complete());

    assert!(repo.get("db1").unwrap_err().is_not_found());
    let renamed = repo.get("db1-prod").unwrap();
    assert_eq!(renamed.hostname, "10.0.0.5");
    assert_eq!(renamed.use_count, 2);
    assert!(renamed.is_pinned());
    assert!(renamed.tags.contains("db"));
    assert!(renamed.secret_present);
    assert!(!repo.has_secret("db1").unwrap());
    assert_eq!(
        repo.get_decrypted_secret("db1-prod")
            .unwrap()
            .expose_secret(),
        "s3cret"
    );
    assert!(config_text(&repo).contains("Host db1-prod\n"));
    assert!(config_text(&repo).contains("ForwardAgent yes   # needed for deploys\n"));

    // Delete removes all three entries.
    let report = repo.delete("db1-prod").unwrap();
    assert_eq!(report.metadata, AuxiliaryOutcome::Applied);
    assert_eq!(report.secret, AuxiliaryOutcome::Applied);
    assert!(repo.get("db1-prod").unwrap_err().is_not_found());
    assert!(!repo.has_secret("db1-prod").unwrap());
    assert!(repo.metadata_store().get("db1-prod").unwrap().is_none());
    // The separator line added with db1 stays behind.
    assert_eq!(config_text(&repo), format!("{HAND_WRITTEN}\n"));
}

#[test]
fn test_first_add_creates_every_file() {
    let dir = TempDir::new().unwrap();
    let repo = repository(dir.path());

    repo.add(&HostDraft::new("web").with_secret(SecretString::from("pw")))
        .unwrap();

    assert_eq!(config_text(&repo), "Host web\n    Port 22\n");
    assert!(repo.paths().metadata.exists());
    assert!(repo.paths().secrets.exists());
    assert_eq!(
        repo.paths().secrets.file_name().unwrap(),
        "passwords.json"
    );
}

#[cfg(unix)]
#[test]
fn test_files_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let repo = repository(dir.path());
    repo.add(&HostDraft::new("web").with_secret(SecretString::from("pw")))
        .unwrap();

    for path in [
        &repo.paths().ssh_config,
        &repo.paths().metadata,
        &repo.paths().secrets,
    ] {
        let mode = fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "{}", path.display());
    }
}

#[test]
fn test_add_collision_leaves_config_byte_identical() {
    let dir = TempDir::new().unwrap();
    let repo = repository(dir.path());
    fs::create_dir_all(dir.path().join(".ssh")).unwrap();
    fs::write(&repo.paths().ssh_config, HAND_WRITTEN).unwrap();
    let before = fs::read(&repo.paths().ssh_config).unwrap();

    let err = repo.add(&HostDraft::new("bastion")).unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists(ref id) if id == "bastion"));
    assert_eq!(fs::read(&repo.paths().ssh_config).unwrap(), before);
    assert!(!repo.paths().metadata.exists());
}

#[test]
fn test_tampered_secret_fails_authentication() {
    let dir = TempDir::new().unwrap();
    let repo = repository(dir.path());
    repo.add(&HostDraft::new("db1").with_secret(SecretString::from("s3cret")))
        .unwrap();

    let raw = fs::read_to_string(&repo.paths().secrets).unwrap();
    let mut secrets: std::collections::BTreeMap<String, String> =
        serde_json::from_str(&raw).unwrap();
    let envelope = secrets.get_mut("db1").unwrap();
    let mut bytes = BASE64.decode(envelope.as_bytes()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    *envelope = BASE64.encode(bytes);
    fs::write(
        &repo.paths().secrets,
        serde_json::to_string_pretty(&secrets).unwrap(),
    )
    .unwrap();

    let err = repo.get_decrypted_secret("db1").unwrap_err();
    assert!(matches!(err, RepositoryError::Authentication(_)));
    assert!(repo.has_secret("db1").unwrap());
}

#[test]
fn test_hand_edits_between_calls_are_seen() {
    let dir = TempDir::new().unwrap();
    let repo = repository(dir.path());
    repo.add(&HostDraft::new("a")).unwrap();

    let mut text = config_text(&repo);
    text.push_str("\nHost b\n    User manual\n");
    fs::write(&repo.paths().ssh_config, text).unwrap();

    assert_eq!(repo.get("b").unwrap().user, "manual");
    assert_eq!(repo.list("manual").unwrap().len(), 1);
}
