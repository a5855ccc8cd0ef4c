//! Data models exposed by the repository

mod host;

pub use host::{
    DEFAULT_PORT, HostDraft, HostRecord, WILDCARD_CHARS, is_wildcard, validate_identity,
};
