//! CLI argument definitions using clap
//!
//! Commands:
//! - bootcamp-api serve [--env-file <path>] [--port <port>]
//! - bootcamp-api seed import [--data-dir <path>] [--env-file <path>]
//! - bootcamp-api seed delete [--env-file <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bootcamp directory REST API
#[derive(Parser, Debug)]
#[command(name = "bootcamp-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Dotenv file to load before reading the environment
        #[arg(long)]
        env_file: Option<PathBuf>,

        /// Override the PORT setting
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load or wipe the sample data in the primary store
    Seed {
        #[command(subcommand)]
        action: SeedAction,

        /// Dotenv file to load before reading the environment
        #[arg(long, global = true)]
        env_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SeedAction {
    /// Import bootcamps, courses, users and reviews from JSON files
    Import {
        /// Directory holding the JSON files (overrides SEED_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Delete every bootcamp, course, user and review
    Delete,
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
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["bootcamp-api", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve { port, env_file } => {
                assert_eq!(port, Some(8080));
                assert!(env_file.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_seed_import() {
        let cli = Cli::try_parse_from(["bootcamp-api", "seed", "import", "--data-dir", "./_data"]).unwrap();
        match cli.command {
            Command::Seed { action, .. } => assert_eq!(
                action,
                SeedAction::Import {
                    data_dir: Some(PathBuf::from("./_data"))
                }
            ),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_seed_requires_action() {
        assert!(Cli::try_parse_from(["bootcamp-api", "seed"]).is_err());
    }
}
