//! CLI module for stationlog
//!
//! Provides command-line interface for:
//! - init: Create a zeroed storage image
//! - run: Boot the node and run the tick loop
//! - dump: Print pending records
//! - erase: Zero the storage image

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{dump, erase, init, run, run_command, run_node};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
