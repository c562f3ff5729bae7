//! CLI argument definitions using clap
//!
//! Commands:
//! - dirsearch search --config <path> [--reverse]
//! - dirsearch validate --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dirsearch - cursor and evaluator engine for directory filter searches
#[derive(Parser, Debug)]
#[command(name = "dirsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a JSON filter from stdin and print the matching entry ids
    Search {
        /// Path to configuration file
        #[arg(long, default_value = "./dirsearch.json")]
        config: PathBuf,

        /// Traverse results last to first
        #[arg(long)]
        reverse: bool,
    },

    /// Load configuration, schema, and entries, then report what was loaded
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./dirsearch.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
