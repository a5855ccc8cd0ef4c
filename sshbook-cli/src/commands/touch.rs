//! Record-use command.

use sshbook_core::HostRepository;

use crate::error::CliError;

/// Touch command handler
pub fn cmd_touch(repo: &HostRepository, identity: &str, quiet: bool) -> Result<(), CliError> {
    let host = repo.get(identity)?;
    let metadata = repo.record_use(&host.identity)?;
    if !quiet {
        println!(
            "Recorded use of '{}' (used {} times)",
            host.identity, metadata.use_count
        );
    }
    Ok(())
}
