//! Delete host command.

use sshbook_core::HostRepository;

use crate::error::CliError;
use crate::util::warn_incomplete;

/// Delete host command handler
pub fn cmd_delete(repo: &HostRepository, identity: &str, quiet: bool) -> Result<(), CliError> {
    let report = repo.delete(identity)?;
    warn_incomplete(&report, quiet);
    if !quiet {
        println!("Deleted host '{identity}'");
    }
    Ok(())
}
