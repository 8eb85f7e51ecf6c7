//! CLI argument definitions using clap
//!
//! Commands:
//! - offlinedb init --config <path>
//! - offlinedb serve --config <path> [--port <port>]
//! - offlinedb store --type <record_type> --config <path>
//! - offlinedb retrieve --type <record_type> --config <path>
//! - offlinedb dump --config <path>
//! - offlinedb stats --config <path>
//! - offlinedb compact --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// offlinedb - a bounded, redacting, append-only record store
#[derive(Parser, Debug)]
#[command(name = "offlinedb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./offlinedb.json")]
        config: PathBuf,
    },

    /// Replay the log and serve the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./offlinedb.json")]
        config: PathBuf,

        /// Overrides `http.port` from the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Store one JSON payload read from stdin
    Store {
        /// Path to configuration file
        #[arg(long, default_value = "./offlinedb.json")]
        config: PathBuf,

        /// Record type to store under
        #[arg(long = "type")]
        record_type: String,
    },

    /// Print all payloads of one record type, oldest first
    Retrieve {
        /// Path to configuration file
        #[arg(long, default_value = "./offlinedb.json")]
        config: PathBuf,

        /// Record type to read
        #[arg(long = "type")]
        record_type: String,
    },

    /// Print every retained record as one JSON row per line
    Dump {
        /// Path to configuration file
        #[arg(long, default_value = "./offlinedb.json")]
        config: PathBuf,
    },

    /// Print store accounting
    Stats {
        /// Path to configuration file
        #[arg(long, default_value = "./offlinedb.json")]
        config: PathBuf,
    },

    /// Rewrite the log to live records only
    Compact {
        /// Path to configuration file
        #[arg(long, default_value = "./offlinedb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
