//! Update host command.

use sshbook_core::{HostDraft, HostRecord, HostRepository};

use crate::cli::HostFields;
use crate::error::CliError;
use crate::util::{read_password, warn_incomplete};

/// Parameters for the `update` command
pub struct UpdateParams<'a> {
    pub identity: &'a str,
    pub rename: Option<&'a str>,
    pub clear_keys: bool,
    pub clear_tags: bool,
    pub fields: &'a HostFields,
}

/// Update host command handler
///
/// Starts from the host's current state, so options that are not given
/// keep their values. Keys and tags given on the command line are added to
/// the existing ones unless `--clear-keys` / `--clear-tags` is passed.
/// `identity` may name any pattern of the host; the update is applied to
/// the host's identity.
pub fn cmd_update(
    repo: &HostRepository,
    params: UpdateParams<'_>,
    quiet: bool,
) -> Result<(), CliError> {
    let current = repo.get(params.identity)?;
    let mut draft = build_draft(&current, &params);
    draft.secret = read_password(params.fields, &draft.identity)?;

    let report = repo.update(&current.identity, &draft)?;
    warn_incomplete(&report, quiet);
    if !quiet {
        match params.rename {
            Some(new_identity) => {
                println!("Updated host '{}' (renamed to '{new_identity}')", current.identity);
            }
            None => println!("Updated host '{}'", current.identity),
        }
    }
    Ok(())
}

/// Builds the draft for an update from the current record and the options
fn build_draft(current: &HostRecord, params: &UpdateParams<'_>) -> HostDraft {
    let fields = params.fields;
    let mut draft = HostDraft::from_record(current);
    if let Some(new_identity) = params.rename {
        draft = draft.with_identity(new_identity);
    }
    if let Some(host) = &fields.host {
        draft = draft.with_hostname(host);
    }
    if let Some(user) = &fields.user {
        draft = draft.with_user(user);
    }
    if let Some(port) = fields.port {
        draft = draft.with_port(port);
    }

    if params.clear_keys {
        draft.identity_files.clear();
    }
    for key in &fields.keys {
        if !draft.identity_files.contains(key) {
            draft.identity_files.push(key.clone());
        }
    }

    if params.clear_tags {
        draft.tags.clear();
    }
    draft.tags.extend(fields.tags.iter().cloned());
    draft
}
