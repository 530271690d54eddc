//! stationlog CLI entry point
//!
//! Parses arguments and dispatches to the CLI module. Errors are reported
//! as JSON on stdout by the command layer, echoed to stderr here, and end
//! the process with exit status 1 so the supervisor restarts the node.

use stationlog::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
