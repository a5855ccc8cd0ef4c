//! List hosts command.

use std::fmt::Write as _;

use serde::Serialize;
use sshbook_core::{HostRecord, HostRepository};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// List hosts command handler
pub fn cmd_list(repo: &HostRepository, query: &str, format: OutputFormat) -> Result<(), CliError> {
    let hosts = repo.list(query)?;

    match format {
        OutputFormat::Table => println!("{}", format_table(&hosts)),
        OutputFormat::Json => println!("{}", format_json(&hosts)?),
    }

    Ok(())
}

/// Format hosts as a table string
#[must_use]
pub fn format_table(hosts: &[HostRecord]) -> String {
    if hosts.is_empty() {
        return "No hosts found.".to_string();
    }

    let mut output = String::new();

    // Calculate column widths
    let identity_width = hosts
        .iter()
        .map(|h| h.identity.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let hostname_width = hosts
        .iter()
        .map(|h| h.hostname.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let user_width = hosts
        .iter()
        .map(|h| h.user.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let port_width = 5;

    let _ = writeln!(
        output,
        "  {:<identity_width$}  {:<hostname_width$}  {:<user_width$}  {:<port_width$}  TAGS",
        "HOST", "HOSTNAME", "USER", "PORT"
    );
    let _ = writeln!(
        output,
        "  {:-<identity_width$}  {:-<hostname_width$}  {:-<user_width$}  {:-<port_width$}  ----",
        "", "", "", ""
    );

    for host in hosts {
        let marker = if host.is_pinned() { '*' } else { ' ' };
        let tags: Vec<&str> = host.tags.iter().map(String::as_str).collect();
        let _ = writeln!(
            output,
            "{marker} {:<identity_width$}  {:<hostname_width$}  {:<user_width$}  {:<port_width$}  {}",
            host.identity,
            host.hostname,
            host.user,
            host.port,
            tags.join(",")
        );
    }

    output.trim_end().to_string()
}

/// JSON output for a host
#[derive(Serialize)]
struct HostOutput<'a> {
    identity: &'a str,
    aliases: &'a [String],
    hostname: &'a str,
    user: &'a str,
    port: u16,
    identity_files: &'a [String],
    tags: Vec<&'a str>,
    pinned: bool,
    last_used_at: Option<String>,
    use_count: u64,
    password_stored: bool,
}

impl<'a> From<&'a HostRecord> for HostOutput<'a> {
    fn from(host: &'a HostRecord) -> Self {
        Self {
            identity: &host.identity,
            aliases: &host.aliases,
            hostname: &host.hostname,
            user: &host.user,
            port: host.port,
            identity_files: &host.identity_files,
            tags: host.tags.iter().map(String::as_str).collect(),
            pinned: host.is_pinned(),
            last_used_at: host.last_used_at.map(|t| t.to_rfc3339()),
            use_count: host.use_count,
            password_stored: host.secret_present,
        }
    }
}

/// Format hosts as JSON string
///
/// # Errors
///
/// Returns `CliError::Output` if JSON serialization fails.
pub fn format_json(hosts: &[HostRecord]) -> Result<String, CliError> {
    let output: Vec<HostOutput<'_>> = hosts.iter().map(HostOutput::from).collect();
    serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))
}
