//! bootcamp-api entry point
//!
//! Parses arguments, runs the command and exits non-zero on failure.

use bootcamp_api::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
