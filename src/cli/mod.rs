//! CLI module for sqlplan
//!
//! Provides command-line interface for:
//! - compile: one statement from stdin to a JSON plan
//! - explain: one statement from stdin to explain text
//! - collations: list the collation registry

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    collations, compile, explain, handle_compile, handle_explain, run, run_command, Config,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
