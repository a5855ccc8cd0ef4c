//! Command handler modules for the CLI.

mod add;
mod completions;
mod delete;
mod list;
mod pin;
mod secret;
mod show;
mod touch;
mod update;

use sshbook_core::Settings;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::util::create_repository;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(cli: Cli, settings: &Settings) -> Result<(), CliError> {
    let repo = create_repository(&cli, settings)?;
    let quiet = cli.quiet;
    match cli.command {
        Commands::List { query, format } => {
            list::cmd_list(&repo, query.as_deref().unwrap_or_default(), format)
        }
        Commands::Show { identity } => show::cmd_show(&repo, &identity),
        Commands::Add { identity, fields } => add::cmd_add(&repo, &identity, &fields, quiet),
        Commands::Update {
            identity,
            rename,
            clear_keys,
            clear_tags,
            fields,
        } => update::cmd_update(
            &repo,
            update::UpdateParams {
                identity: &identity,
                rename: rename.as_deref(),
                clear_keys,
                clear_tags,
                fields: &fields,
            },
            quiet,
        ),
        Commands::Delete { identity } => delete::cmd_delete(&repo, &identity, quiet),
        Commands::Pin { identity } => pin::cmd_pin(&repo, &identity, true, quiet),
        Commands::Unpin { identity } => pin::cmd_pin(&repo, &identity, false, quiet),
        Commands::Touch { identity } => touch::cmd_touch(&repo, &identity, quiet),
        Commands::Secret(subcmd) => secret::cmd_secret(&repo, subcmd),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
