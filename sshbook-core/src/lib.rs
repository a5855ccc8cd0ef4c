//! `sshbook` Core Library
//!
//! A format-preserving repository over an OpenSSH client config file, with
//! per-host metadata and encrypted secrets kept in sidecar files.
//!
//! # Crate Structure
//!
//! - [`ssh_config`] - Lossless config document model (parse, mutate, render)
//! - [`repository`] - [`HostRepository`], the consumer-facing facade
//! - [`metadata`] - Tags, pin state and usage counters sidecar
//! - [`secret`] - AES-256-GCM secret envelopes and their sidecar
//! - [`backup`] / [`atomic`] - Pristine and rolling backups, atomic replace
//! - [`fs`] - Filesystem capability with OS and in-memory implementations
//! - [`config`] - Repository paths and the optional settings file
//! - [`tracing`] - Logging setup and span names
//!
//! # Example
//!
//! ```no_run
//! use sshbook_core::{HostDraft, HostRepository, RepositoryPaths};
//!
//! let repo = HostRepository::new(RepositoryPaths::from_home()?);
//! repo.add(&HostDraft::new("db1").with_hostname("10.0.0.5").with_user("root"))?;
//! for host in repo.list("db")? {
//!     println!("{} -> {}", host.identity, host.hostname);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod atomic;
pub mod backup;
pub mod config;
pub mod error;
pub mod fs;
pub mod metadata;
pub mod models;
pub mod repository;
pub mod secret;
pub mod ssh_config;
pub mod tracing;

pub use config::{RepositoryPaths, Settings, SettingsError, SettingsResult};
pub use error::{RepositoryError, RepositoryResult};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use metadata::{HostMetadata, MetadataStore};
pub use models::{HostDraft, HostRecord};
pub use repository::{AuxiliaryOutcome, HostRepository, MutationReport};
pub use secret::{SecretCipher, SecretStore};
pub use ssh_config::{ConfigDocument, ParseError};
