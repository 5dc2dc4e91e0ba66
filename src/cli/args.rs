//! CLI argument definitions using clap derive

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// filecache - inspect and prune a memoization cache directory
///
/// Lists, shows and evicts the records that memoized operations store
/// under a cache directory.
#[derive(Parser, Debug)]
#[command(name = "filecache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FILECACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory (overrides cache.dir from the config)
    #[arg(short, long, global = true, env = "FILECACHE_DIR")]
    pub dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List cached records
    List(ListArgs),

    /// Show one record
    Show(ShowArgs),

    /// Remove one record
    Remove(RemoveArgs),

    /// Remove all records, or those older than a date
    Clear(ClearArgs),

    /// Print the record name a call would map to
    Key(KeyArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Record name (as printed by `filecache list`)
    pub name: String,

    /// Print only the cached value, without the envelope
    #[arg(long)]
    pub value_only: bool,
}

/// Arguments for the remove command
#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Record names to remove
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Only remove records last modified before this date (YYYY-MM-DD, local midnight)
    #[arg(long, value_parser = parse_date)]
    pub before: Option<NaiveDate>,

    /// Dry run - show what would be removed
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Operation identity (the record name prefix)
    pub identity: String,

    /// Positional arguments as JSON values (e.g. 5, '"text"', '[1,2]')
    #[arg(allow_negative_numbers = true)]
    pub args: Vec<String>,

    /// Named argument as KEY=JSON (repeatable)
    #[arg(short, long = "named", value_name = "KEY=JSON")]
    pub named: Vec<String>,

    /// Leave the first positional argument out of the fingerprint
    #[arg(long)]
    pub exclude_first: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.lookup)
        key: String,
        /// Value to set
        value: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {:?}: {}", s, e))
}
