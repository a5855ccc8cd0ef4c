//! Pin and unpin commands.

use sshbook_core::HostRepository;

use crate::error::CliError;

/// Pin/unpin command handler
///
/// The host must exist in the SSH config; metadata for unknown identities
/// is not created from the command line. An alias resolves to the host's
/// identity.
pub fn cmd_pin(
    repo: &HostRepository,
    identity: &str,
    pinned: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let host = repo.get(identity)?;
    repo.set_pinned(&host.identity, pinned)?;
    if !quiet {
        let action = if pinned { "Pinned" } else { "Unpinned" };
        println!("{action} host '{}'", host.identity);
    }
    Ok(())
}
