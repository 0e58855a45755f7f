use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "sealsave",
    about = "Encrypted save files for structured game configuration",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print version and exit.
    Version,
    /// Encrypted save/load round trip against the configured data dir.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the encryption key.
    #[command(subcommand)]
    Keys(KeysCommand),
    /// List registered serializer formats.
    Formats,
    /// Encrypt a JSON document and save it as `<name>.dat`.
    Save {
        /// File name without extension.
        name: String,
        /// JSON document to store.
        #[arg(long, short)]
        input: PathBuf,
        /// Serializer format id (defaults to the configured format).
        #[arg(long, short)]
        format: Option<String>,
    },
    /// Decrypt `<name>.dat` and print its JSON.
    Show {
        name: String,
        #[arg(long, short)]
        format: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum KeysCommand {
    /// Load the stored key or generate a new one.
    Init,
    /// Delete the stored key; existing saves become unreadable.
    Reset,
    /// Report whether a usable key is stored.
    Status,
}
