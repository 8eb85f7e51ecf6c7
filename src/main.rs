//! offlinedb CLI entry point
//!
//! Parses arguments, dispatches to `cli::run`, reports a failure as one JSON
//! line on stderr and exits non-zero. Nothing else happens here.

use offlinedb::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code_str(), &e.message());
        std::process::exit(1);
    }
}
