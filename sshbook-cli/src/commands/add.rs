//! Add host command.

use sshbook_core::models::DEFAULT_PORT;
use sshbook_core::{HostDraft, HostRepository};

use crate::cli::HostFields;
use crate::error::CliError;
use crate::util::{read_password, warn_incomplete};

/// Add host command handler
pub fn cmd_add(
    repo: &HostRepository,
    identity: &str,
    fields: &HostFields,
    quiet: bool,
) -> Result<(), CliError> {
    let mut draft = build_draft(identity, fields);
    draft.secret = read_password(fields, identity)?;

    let report = repo.add(&draft)?;
    warn_incomplete(&report, quiet);
    if !quiet {
        println!("Added host '{identity}'");
    }
    Ok(())
}

/// Builds the draft for a new host from command-line fields
fn build_draft(identity: &str, fields: &HostFields) -> HostDraft {
    let mut draft = HostDraft::new(identity).with_port(fields.port.unwrap_or(DEFAULT_PORT));
    if let Some(host) = &fields.host {
        draft = draft.with_hostname(host);
    }
    if let Some(user) = &fields.user {
        draft = draft.with_user(user);
    }
    draft.identity_files.clone_from(&fields.keys);
    draft.tags = fields.tags.iter().cloned().collect();
    draft
}
