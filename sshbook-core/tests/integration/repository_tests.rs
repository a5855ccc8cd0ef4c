//! Repository tests on the in-memory filesystem
//!
//! Failures are injected to check that the SSH config stays authoritative:
//! a failed config write leaves the old file in place, and failed sidecar
//! writes are reported without undoing the config change.

use secrecy::SecretString;
use sshbook_core::{
    AuxiliaryOutcome, HostDraft, HostRepository, MemoryFileSystem, RepositoryError,
    RepositoryPaths,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG: &str = "/home/alice/.ssh/config";
const DATA_DIR: &str = "/home/alice/.sshbook";

const INITIAL: &str = "\
Host web web.internal
  HostName 192.168.1.10
  User deploy
  IdentityFile ~/.ssh/web
  LocalForward 8080 localhost:80
";

fn setup() -> (Arc<MemoryFileSystem>, HostRepository) {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.insert(CONFIG, INITIAL);
    let paths = RepositoryPaths::in_data_dir(CONFIG, Path::new(DATA_DIR));
    let repo = HostRepository::with_file_system(paths, fs.clone());
    (fs, repo)
}

fn config_bytes(fs: &MemoryFileSystem) -> Vec<u8> {
    fs.contents(Path::new(CONFIG)).expect("config should exist")
}

fn temp_files(fs: &MemoryFileSystem) -> Vec<PathBuf> {
    fs.paths()
        .into_iter()
        .filter(|p| p.to_string_lossy().contains(".tmp."))
        .collect()
}

#[test]
fn test_crash_before_rename_keeps_original() {
    let (fs, repo) = setup();
    fs.fail_renames_onto(CONFIG);

    let err = repo
        .add(&HostDraft::new("db1").with_secret(SecretString::from("pw")))
        .unwrap_err();
    assert!(err.to_string().starts_with("Failed to add host"));
    assert!(matches!(err.root(), RepositoryError::Io { .. }));

    assert_eq!(config_bytes(&fs), INITIAL.as_bytes());
    assert!(temp_files(&fs).is_empty());
    // Sidecars are only touched after the config commit.
    assert!(!repo.has_secret("db1").unwrap());
    assert!(repo.metadata_store().get("db1").unwrap().is_none());

    fs.clear_failures();
    repo.add(&HostDraft::new("db1")).unwrap();
    assert!(repo.get("db1").is_ok());
}

#[test]
fn test_secret_failure_is_reported_not_raised() {
    let (fs, repo) = setup();
    fs.fail_renames_onto(format!("{DATA_DIR}/passwords.json"));

    let report = repo
        .add(&HostDraft::new("db1").with_secret(SecretString::from("pw")))
        .unwrap();
    assert!(report.secret.is_failed());
    assert_eq!(report.metadata, AuxiliaryOutcome::Applied);
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].0, "secret");

    assert!(repo.get("db1").is_ok());
    assert!(!repo.has_secret("db1").unwrap());
}

#[test]
fn test_update_preserves_unrelated_lines() {
    let (fs, repo) = setup();
    let host = repo.get("web").unwrap();
    assert_eq!(host.aliases, vec!["web", "web.internal"]);

    repo.update(
        "web",
        &HostDraft::from_record(&host)
            .with_identity("frontend")
            .with_user("www"),
    )
    .unwrap();

    let text = String::from_utf8(config_bytes(&fs)).unwrap();
    assert_eq!(
        text,
        "\
Host frontend web.internal
  HostName 192.168.1.10
  User www
  IdentityFile ~/.ssh/web
  LocalForward 8080 localhost:80
"
    );
}

#[test]
fn test_update_replaces_identity_files_and_sets_port() {
    let (fs, repo) = setup();
    let mut draft = HostDraft::from_record(&repo.get("web").unwrap()).with_port(2222);
    draft.identity_files = vec!["~/.ssh/a".to_string(), "~/.ssh/b".to_string()];

    repo.update("web", &draft).unwrap();

    let host = repo.get("web").unwrap();
    assert_eq!(host.port, 2222);
    assert_eq!(host.identity_files, vec!["~/.ssh/a", "~/.ssh/b"]);
    let text = String::from_utf8(config_bytes(&fs)).unwrap();
    assert!(text.contains("LocalForward 8080 localhost:80"));
    assert_eq!(text.matches("IdentityFile").count(), 2);
}

#[test]
fn test_empty_fields_do_not_clear_config_values() {
    let (_, repo) = setup();
    repo.update("web", &HostDraft::new("web")).unwrap();

    let host = repo.get("web").unwrap();
    assert_eq!(host.hostname, "192.168.1.10");
    assert_eq!(host.user, "deploy");
    assert!(host.identity_files.is_empty());
}

#[test]
fn test_rename_to_existing_identity_touches_nothing() {
    let (fs, repo) = setup();
    repo.add(&HostDraft::new("api").with_secret(SecretString::from("pw")))
        .unwrap();
    repo.record_use("web").unwrap();
    let config_before = config_bytes(&fs);
    let metadata_before = fs.contents(Path::new(&format!("{DATA_DIR}/metadata.json")));
    let secrets_before = fs.contents(Path::new(&format!("{DATA_DIR}/passwords.json")));

    let err = repo.update("web", &HostDraft::new("api")).unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists(_)));

    assert_eq!(config_bytes(&fs), config_before);
    assert_eq!(
        fs.contents(Path::new(&format!("{DATA_DIR}/metadata.json"))),
        metadata_before
    );
    assert_eq!(
        fs.contents(Path::new(&format!("{DATA_DIR}/passwords.json"))),
        secrets_before
    );
}

#[test]
fn test_secondary_alias_is_taken() {
    let (_, repo) = setup();
    let err = repo.add(&HostDraft::new("web.internal")).unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists(_)));
    // Lookup by an alias resolves to the same block.
    assert_eq!(repo.get("web.internal").unwrap().identity, "web");
}

#[test]
fn test_hand_written_identity_can_be_updated() {
    let (fs, repo) = setup();
    fs.insert(CONFIG, "Host \"my box\"  # lab\n  User old\n");
    let host = repo.list("").unwrap().remove(0);
    assert_eq!(host.identity, "my box");

    repo.update(&host.identity, &HostDraft::from_record(&host).with_user("x"))
        .unwrap();
    let text = String::from_utf8(config_bytes(&fs)).unwrap();
    assert_eq!(text, "Host \"my box\"  # lab\n  User x\n");

    // Renaming still requires a valid new identity.
    let err = repo
        .update("my box", &HostDraft::from_record(&host).with_identity("other box"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation { .. }));

    repo.update("my box", &HostDraft::from_record(&host).with_identity("mybox"))
        .unwrap();
    assert_eq!(repo.get("mybox").unwrap().user, "old");
}

#[test]
fn test_delete_by_alias_removes_sidecar_entries() {
    let (_, repo) = setup();
    repo.update(
        "web",
        &HostDraft::from_record(&repo.get("web").unwrap())
            .with_tag("frontend")
            .with_secret(SecretString::from("pw")),
    )
    .unwrap();
    repo.set_pinned("web", true).unwrap();

    let report = repo.delete("web.internal").unwrap();
    assert_eq!(report.metadata, AuxiliaryOutcome::Applied);
    assert_eq!(report.secret, AuxiliaryOutcome::Applied);
    assert!(repo.metadata_store().get("web").unwrap().is_none());
    assert!(!repo.has_secret("web").unwrap());
}

#[test]
fn test_filtering() {
    let (_, repo) = setup();
    repo.add(
        &HostDraft::new("db1")
            .with_hostname("10.0.0.5")
            .with_user("postgres")
            .with_tag("Production"),
    )
    .unwrap();

    let ids = |query: &str| -> Vec<String> {
        repo.list(query)
            .unwrap()
            .into_iter()
            .map(|h| h.identity)
            .collect()
    };
    assert_eq!(ids(""), vec!["web", "db1"]);
    assert_eq!(ids("production"), vec!["db1"]);
    assert_eq!(ids("POSTGRES"), vec!["db1"]);
    assert_eq!(ids("internal"), vec!["web"]);
    assert_eq!(ids("192.168"), vec!["web"]);
    assert!(ids("nothing-matches").is_empty());
}

#[test]
fn test_pin_and_use_counters() {
    let (_, repo) = setup();
    repo.set_pinned("web", true).unwrap();
    let first = repo.record_use("web").unwrap();
    let second = repo.record_use("web").unwrap();

    assert_eq!(first.use_count, 1);
    assert_eq!(second.use_count, 2);
    assert!(second.last_used_at >= first.last_used_at);

    let host = repo.get("web").unwrap();
    assert!(host.is_pinned());
    assert_eq!(host.use_count, 2);

    repo.set_pinned("web", false).unwrap();
    assert!(!repo.get("web").unwrap().is_pinned());
}

#[test]
fn test_missing_secret() {
    let (_, repo) = setup();
    assert!(!repo.has_secret("web").unwrap());
    assert!(repo.get_decrypted_secret("web").unwrap_err().is_not_found());
}

#[test]
fn test_empty_secret_is_ignored() {
    let (_, repo) = setup();
    let report = repo
        .add(&HostDraft::new("db1").with_secret(SecretString::from("")))
        .unwrap();
    assert_eq!(report.secret, AuxiliaryOutcome::Skipped);
    assert!(!repo.has_secret("db1").unwrap());
}
