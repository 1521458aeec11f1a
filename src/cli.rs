//! Command-line interface definitions for ebookdedupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, root, database) apply to every subcommand; running
//! without a subcommand removes duplicates under the root.
//!
//! # Example
//!
//! ```bash
//! # Remove duplicates under the current directory (default command)
//! ebookdedupe
//!
//! # Preview what would be removed under ~/Books, as JSON
//! ebookdedupe -p ~/Books remove-duplicates --dry-run --output json
//!
//! # Search the index
//! ebookdedupe --db ~/books.db search tolkien
//!
//! # Rename every EPUB under a folder from its metadata
//! ebookdedupe rename ~/Books/incoming
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Content-hash dedupe for e-book libraries.
///
/// Keeps one copy of every distinct file under a root, remembered across runs
/// in a SQLite index, and renames EPUBs from their embedded titles.
#[derive(Debug, Parser)]
#[command(name = "ebookdedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Root directory to operate on
    #[arg(short = 'p', long = "path", value_name = "ROOT", global = true)]
    pub root: Option<PathBuf>,

    /// Index database file
    #[arg(long = "db", value_name = "FILE", global = true)]
    pub database: Option<PathBuf>,

    /// Subcommand to execute (default: remove-duplicates)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run, defaulting to remove-duplicates.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::RemoveDuplicates(DedupeArgs::default()))
    }

    /// Whether stdout carries a machine-readable report.
    #[must_use]
    pub fn json_output(&self) -> bool {
        matches!(
            &self.command,
            Some(Commands::RemoveDuplicates(args)) if args.output == OutputFormat::Json
        )
    }
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Hash every file under the root and remove duplicate copies
    #[command(visible_alias = "dedupe")]
    RemoveDuplicates(DedupeArgs),
    /// Count the files under the root
    Count,
    /// List indexed paths containing a substring (case-insensitive)
    Search(SearchArgs),
    /// Rename EPUB files to the title in their metadata
    Rename(RenameArgs),
    /// Print DATA with every occurrence of PATTERN removed
    StripSubstring(StripArgs),
}

/// Arguments for remove-duplicates.
#[derive(Debug, Clone, Default, Args)]
pub struct DedupeArgs {
    /// Report what would be removed without touching files or the index
    #[arg(long)]
    pub dry_run: bool,

    /// Move duplicates to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Copy marker in file names (repeatable, replaces the configured list)
    #[arg(long = "marker", value_name = "MARKER")]
    pub markers: Vec<String>,

    /// Also deduplicate zero-length files
    #[arg(long)]
    pub include_empty: bool,

    /// Follow symbolic links during the walk
    ///
    /// Link cycles are detected and skipped.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Arguments for search.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Substring to look for
    #[arg(value_name = "SUBSTRING")]
    pub query: String,
}

/// Arguments for rename.
#[derive(Debug, Clone, Args)]
pub struct RenameArgs {
    /// EPUB file or directory of books
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

/// Arguments for strip-substring.
#[derive(Debug, Clone, Args)]
pub struct StripArgs {
    /// Text to clean
    #[arg(value_name = "DATA", allow_hyphen_values = true)]
    pub data: String,

    /// Substring to remove
    #[arg(value_name = "PATTERN", allow_hyphen_values = true)]
    pub pattern: String,
}

/// Output format for the remove-duplicates report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
