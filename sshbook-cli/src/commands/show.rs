//! Show host details command.

use sshbook_core::{HostRecord, HostRepository};

use crate::error::CliError;

/// Show host details command handler
pub fn cmd_show(repo: &HostRepository, identity: &str) -> Result<(), CliError> {
    let host = repo.get(identity)?;
    print!("{}", format_details(&host));
    Ok(())
}

/// Formats a host as an aligned key/value listing
#[must_use]
pub fn format_details(host: &HostRecord) -> String {
    let mut lines = vec![
        "Host Details:".to_string(),
        format!("  Identity: {}", host.identity),
    ];
    if host.aliases.len() > 1 {
        lines.push(format!("  Aliases:  {}", host.aliases[1..].join(", ")));
    }
    if !host.hostname.is_empty() {
        lines.push(format!("  HostName: {}", host.hostname));
    }
    if !host.user.is_empty() {
        lines.push(format!("  User:     {}", host.user));
    }
    lines.push(format!("  Port:     {}", host.port));
    for key in &host.identity_files {
        lines.push(format!("  Key:      {key}"));
    }
    if !host.tags.is_empty() {
        let tags: Vec<&str> = host.tags.iter().map(String::as_str).collect();
        lines.push(format!("  Tags:     {}", tags.join(", ")));
    }
    if let Some(pinned_at) = host.pinned_at {
        lines.push(format!("  Pinned:   {}", pinned_at.format("%Y-%m-%d %H:%M")));
    }
    if let Some(last_used) = host.last_used_at {
        lines.push(format!("  Last use: {}", last_used.format("%Y-%m-%d %H:%M")));
    }
    lines.push(format!("  Uses:     {}", host.use_count));
    lines.push(format!(
        "  Password: {}",
        if host.secret_present { "stored" } else { "none" }
    ));

    let mut output = lines.join("\n");
    output.push('\n');
    output
}
