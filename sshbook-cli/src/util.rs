//! Shared utility functions used across command modules.

use secrecy::SecretString;
use sshbook_core::{HostRepository, MutationReport, Settings};

use crate::cli::{Cli, HostFields};
use crate::error::CliError;

/// Loads the settings file named on the command line, or the default one.
pub fn load_settings(cli: &Cli) -> Result<Settings, CliError> {
    let path = match (&cli.config, &cli.data_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => dir.join(sshbook_core::config::SETTINGS_FILE_NAME),
        (None, None) => Settings::default_path()?,
    };
    Ok(Settings::load(&path)?)
}

/// Creates the repository from settings and command-line overrides.
pub fn create_repository(cli: &Cli, settings: &Settings) -> Result<HostRepository, CliError> {
    let paths = settings.resolve_paths(cli.ssh_config.as_deref(), cli.data_dir.as_deref())?;
    tracing::debug!(
        ssh_config = %paths.ssh_config.display(),
        metadata = %paths.metadata.display(),
        "Resolved repository paths"
    );
    Ok(HostRepository::new(paths))
}

/// Reads the password to store, if the host fields ask for one
///
/// `--ask-password` prompts on the terminal without echo and
/// `--password-stdin` reads the first line of standard input.
pub fn read_password(fields: &HostFields, identity: &str) -> Result<Option<SecretString>, CliError> {
    let password = if fields.password_stdin {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else if fields.ask_password {
        eprint!("Enter password for '{identity}': ");
        rpassword::read_password()
            .map_err(|e| CliError::Secret(format!("Failed to read password: {e}")))?
    } else {
        return Ok(None);
    };
    Ok(Some(SecretString::from(password)))
}

/// Prints a warning for every sidecar update that failed
pub fn warn_incomplete(report: &MutationReport, quiet: bool) {
    if quiet {
        return;
    }
    for (store, reason) in report.failures() {
        eprintln!("Warning: {store} not updated: {reason}");
    }
}
