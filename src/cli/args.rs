//! CLI argument definitions using clap
//!
//! Commands:
//! - stationlog init --config <path>
//! - stationlog run --config <path> [--ticks N]
//! - stationlog dump --config <path>
//! - stationlog erase --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// stationlog - store-and-forward weather station node
#[derive(Parser, Debug)]
#[command(name = "stationlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty storage image
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./stationlog.json")]
        config: PathBuf,
    },

    /// Boot the node and run the tick loop
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "./stationlog.json")]
        config: PathBuf,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Print the pending records without modifying the image
    Dump {
        /// Path to configuration file
        #[arg(long, default_value = "./stationlog.json")]
        config: PathBuf,
    },

    /// Zero the storage image
    Erase {
        /// Path to configuration file
        #[arg(long, default_value = "./stationlog.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_ticks() {
        let cli = Cli::try_parse_from(["stationlog", "run", "--config", "node.json", "--ticks", "5"])
            .unwrap();
        match cli.command {
            Command::Run { config, ticks } => {
                assert_eq!(config, PathBuf::from("node.json"));
                assert_eq!(ticks, Some(5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["stationlog", "dump"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Dump { config } if config == PathBuf::from("./stationlog.json")
        ));
    }
}
