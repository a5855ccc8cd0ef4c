//! Stored password commands.

use secrecy::ExposeSecret;
use sshbook_core::HostRepository;

use crate::cli::SecretCommands;
use crate::error::CliError;

/// Secret command handler
///
/// Passwords are keyed by host identity, so an alias is resolved first.
pub fn cmd_secret(repo: &HostRepository, subcmd: SecretCommands) -> Result<(), CliError> {
    match subcmd {
        SecretCommands::Has { identity } => {
            let host = repo.get(&identity)?;
            if repo.has_secret(&host.identity)? {
                println!("yes");
                Ok(())
            } else {
                Err(CliError::NotFound(format!("password for {}", host.identity)))
            }
        }
        SecretCommands::Show { identity } => {
            let host = repo.get(&identity)?;
            let secret = repo.get_decrypted_secret(&host.identity)?;
            println!("{}", secret.expose_secret());
            Ok(())
        }
    }
}
