//! CLI argument parsing using clap.

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// PromptSQL - run model SQL scripts against LLM-backed engines
#[derive(Parser, Debug)]
#[command(name = "promptsql")]
#[command(about = "Create and query LLM-backed models with SQL", long_about = None)]
#[command(version)]
pub struct Args {
    /// SQL script files to run in order (reads from stdin if none provided)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Compact JSON output (no pretty-printing)
    #[arg(long)]
    pub compact: bool,

    /// Wait for each created model to finish training before the next statement
    #[arg(short, long)]
    pub wait: bool,

    /// Give up waiting for a model after this many seconds
    #[arg(long, value_name = "SECS", requires = "wait")]
    pub wait_timeout: Option<u64>,

    /// Only report errors on stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Print the JSON Schema of the configuration file and exit
    #[arg(long)]
    pub config_schema: bool,
}

impl Args {
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout.map(Duration::from_secs)
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// JSON array of statement results
    Json,
}
