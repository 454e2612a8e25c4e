//! CLI module for the bootcamp API
//!
//! Provides command-line interface for:
//! - serve: Connect the stores and start the HTTP server
//! - seed import / seed delete: Manage the sample data

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, SeedAction};
pub use commands::{run, run_command, seed, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
