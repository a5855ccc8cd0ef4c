//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// `sshbook` command-line interface for managing hosts in an SSH config
#[derive(Parser)]
#[command(name = "sshbook")]
#[command(author, version, about = "Manage SSH config hosts with tags, pins and stored passwords")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file (defaults to <data dir>/settings.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SSH config file to manage
    #[arg(long, global = true, env = "SSHBOOK_SSH_CONFIG", value_name = "PATH")]
    pub ssh_config: Option<PathBuf>,

    /// Directory holding the metadata and password files
    #[arg(long, global = true, env = "SSHBOOK_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List hosts
    #[command(about = "List hosts, optionally filtered by a search query")]
    List {
        /// Case-insensitive text matched against hostname, user, tags and
        /// aliases
        query: Option<String>,

        /// Output format for the host list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Show host details
    #[command(about = "Show details of a single host")]
    Show {
        /// Host identity
        identity: String,
    },

    /// Add a new host
    #[command(about = "Add a new host to the SSH config")]
    Add {
        /// Identity (the `Host` pattern)
        identity: String,

        #[command(flatten)]
        fields: HostFields,
    },

    /// Update an existing host
    #[command(about = "Update or rename an existing host")]
    Update {
        /// Current identity
        identity: String,

        /// New identity
        #[arg(long, value_name = "IDENTITY")]
        rename: Option<String>,

        /// Remove every `IdentityFile` before adding the given keys
        #[arg(long)]
        clear_keys: bool,

        /// Remove every tag before adding the given tags
        #[arg(long)]
        clear_tags: bool,

        #[command(flatten)]
        fields: HostFields,
    },

    /// Delete a host
    #[command(about = "Delete a host with its metadata and stored password")]
    Delete {
        /// Host identity
        identity: String,
    },

    /// Pin a host
    #[command(about = "Mark a host as pinned")]
    Pin {
        /// Host identity
        identity: String,
    },

    /// Unpin a host
    #[command(about = "Remove the pin from a host")]
    Unpin {
        /// Host identity
        identity: String,
    },

    /// Record a use of a host
    #[command(about = "Record a use of a host (updates last used and use count)")]
    Touch {
        /// Host identity
        identity: String,
    },

    /// Stored password operations
    #[command(subcommand)]
    Secret(SecretCommands),

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Host fields shared by `add` and `update`
#[derive(clap::Args, Debug, Default)]
pub struct HostFields {
    /// Host address (`HostName`)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Login user (`User`)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Port number
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Private key path (`IdentityFile`); repeatable
    #[arg(short, long = "key", value_name = "PATH")]
    pub keys: Vec<String>,

    /// Tag; repeatable
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Prompt for a password to store encrypted
    #[arg(long)]
    pub ask_password: bool,

    /// Read the password to store from the first line of standard input
    #[arg(long, conflicts_with = "ask_password")]
    pub password_stdin: bool,
}

/// Stored password subcommands
#[derive(Subcommand)]
pub enum SecretCommands {
    /// Check whether a password is stored
    #[command(about = "Check whether a password is stored for a host")]
    Has {
        /// Host identity
        identity: String,
    },

    /// Print the stored password
    #[command(about = "Decrypt and print the stored password of a host")]
    Show {
        /// Host identity
        identity: String,
    },
}

/// Output format for the list command
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}
