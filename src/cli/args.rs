//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::EntryType;

/// Typed, hierarchical settings bundles stored as JSON documents
#[derive(Parser, Debug)]
#[command(name = "sbd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the bundle as a tree
    Tree {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print every entry with its path, type and value
    List {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the value at a dotted path
    Get {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Dotted path, e.g. Root.Group.Entry
        path: String,
    },

    /// Set the value of an entry (parsed according to its type)
    Set {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Dotted path of the entry
        path: String,
        /// New value
        #[arg(required_unless_present = "null")]
        value: Option<String>,
        /// Clear the value
        #[arg(long, conflicts_with = "value")]
        null: bool,
    },

    /// Add an empty root group
    AddRoot {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Root id
        id: String,
        /// Description
        #[arg(long)]
        desc: Option<String>,
    },

    /// Add an entry to a group
    AddEntry {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Dotted path of the parent group
        group: String,
        /// Entry id
        id: String,
        /// Entry type: string, int or bool
        #[arg(value_parser = parse_scalar_type)]
        entry_type: EntryType,
        /// Initial value (null when omitted)
        value: Option<String>,
        /// Description
        #[arg(long)]
        desc: Option<String>,
    },

    /// Add an empty group to a group
    AddGroup {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Dotted path of the parent group
        group: String,
        /// Group id
        id: String,
        /// Description
        #[arg(long)]
        desc: Option<String>,
    },

    /// Remove an entry, group or root
    Remove {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Dotted path of the node
        path: String,
        /// Also remove non-empty groups
        #[arg(short, long)]
        recursive: bool,
    },

    /// Create a new, empty bundle file
    New {
        /// Bundle file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Bundle description
        #[arg(long)]
        desc: Option<String>,
    },

    /// Validate a bundle file or all bundle files in a directory
    Check {
        /// File or directory
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Create global config template
    Init,
}

/// Scalar type names accepted on the command line (case-insensitive).
pub fn parse_scalar_type(s: &str) -> Result<EntryType, String> {
    match s.to_ascii_lowercase().as_str() {
        "string" | "str" => Ok(EntryType::String),
        "int" | "integer" => Ok(EntryType::Int),
        "bool" | "boolean" => Ok(EntryType::Bool),
        _ => Err(format!("'{}' is not a scalar type (string, int, bool)", s)),
    }
}
