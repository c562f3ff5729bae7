//! CLI module for dirsearch
//!
//! Provides command-line interface for:
//! - search: run one JSON filter against a JSON entries file
//! - validate: load and check configuration, schema, and entries

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run_command, search, validate, CliConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}
