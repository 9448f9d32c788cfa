//! CLI argument definitions using clap
//!
//! Commands:
//! - sqlplan compile --catalog <path> [--config <path>]
//! - sqlplan explain --catalog <path> [--config <path>]
//! - sqlplan collations [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sqlplan - compile SQL statements into typed operator plans
#[derive(Parser, Debug)]
#[command(name = "sqlplan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile one JSON statement read from stdin
    Compile {
        /// Catalog snapshot; overrides `catalog_path` from the config
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the explain output for one JSON statement read from stdin
    Explain {
        /// Catalog snapshot; overrides `catalog_path` from the config
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the registered collations
    Collations {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
