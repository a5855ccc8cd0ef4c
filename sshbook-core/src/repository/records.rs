//! Conversion between config blocks and host records

use std::collections::HashSet;

use crate::metadata::MetadataMap;
use crate::models::{DEFAULT_PORT, HostDraft, HostRecord, is_wildcard};
use crate::secret::SecretMap;
use crate::ssh_config::{Block, ConfigDocument};

/// Derives a record from a `Host` block
///
/// Returns `None` if every pattern is a wildcard.
pub(crate) fn record_from_block(block: &Block) -> Option<HostRecord> {
    let aliases: Vec<String> = block
        .patterns()
        .iter()
        .filter(|p| !is_wildcard(p))
        .cloned()
        .collect();
    let identity = aliases.first()?.clone();

    let port = match block.value("Port") {
        None => DEFAULT_PORT,
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) if port != 0 => port,
            _ => {
                tracing::warn!(identity = %identity, port = raw, "Invalid port, using default");
                DEFAULT_PORT
            }
        },
    };

    let mut record = HostRecord::new(identity);
    record.aliases = aliases;
    record.hostname = block.value("HostName").unwrap_or_default().to_string();
    record.user = block.value("User").unwrap_or_default().to_string();
    record.port = port;
    record.identity_files = block
        .values("IdentityFile")
        .into_iter()
        .map(ToString::to_string)
        .collect();
    Some(record)
}

/// Derives records for every concrete `Host` block in document order
///
/// When several blocks share an identity only the first is reported, since
/// lookups by identity always resolve to the first block.
pub(crate) fn records_from_document(document: &ConfigDocument) -> Vec<HostRecord> {
    let mut seen = HashSet::new();
    document
        .host_blocks()
        .filter_map(record_from_block)
        .filter(|record| {
            let first = seen.insert(record.identity.clone());
            if !first {
                tracing::debug!(identity = %record.identity, "Skipping duplicate host block");
            }
            first
        })
        .collect()
}

/// Overlays metadata and secret presence onto derived records
pub(crate) fn merge(
    records: &mut [HostRecord],
    metadata: &MetadataMap,
    secrets: Option<&SecretMap>,
) {
    for record in records {
        if let Some(entry) = metadata.get(&record.identity) {
            record.apply_metadata(entry);
        }
        record.secret_present = secrets.is_some_and(|s| s.contains_key(&record.identity));
    }
}

/// Writes the config fields of `draft` into `block`
///
/// `HostName` and `User` are only written when non-empty. `Port` is written
/// when the block already has one or the port is not the default, so an
/// implicit default stays implicit. The `IdentityFile` list replaces
/// whatever the block had. Returns true if the block changed.
pub(crate) fn apply_draft(block: &mut Block, draft: &HostDraft) -> bool {
    let mut changed = false;
    if !draft.hostname.is_empty() {
        changed |= block.upsert_directive("hostname", &draft.hostname);
    }
    if !draft.user.is_empty() {
        changed |= block.upsert_directive("user", &draft.user);
    }
    if draft.port != DEFAULT_PORT || block.value("port").is_some() {
        changed |= block.upsert_directive("port", &draft.port.to_string());
    }
    changed |= block.replace_directive_family("identityfile", &draft.identity_files);
    changed
}

/// Builds a new `Host` block for `draft`, always with an explicit `Port`
pub(crate) fn block_from_draft(draft: &HostDraft) -> Block {
    let mut block = Block::host(&draft.identity);
    apply_draft(&mut block, draft);
    block.upsert_directive("port", &draft.port.to_string());
    block
}
