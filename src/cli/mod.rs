//! CLI module for offlinedb
//!
//! - init: Create the data directory
//! - serve: Replay the log and serve the HTTP API
//! - store / retrieve: One-shot record operations over stdin/stdout
//! - dump / stats / compact: Inspection and maintenance

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{compact, dump, init, retrieve, run, run_command, serve, stats, store};
pub use config::Config;
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_line, write_response};
