//! CLI errors
//!
//! A CLI error ends the process with a non-zero exit. Plan rejections are
//! not CLI errors; they are reported as error responses on stdout.

use std::fmt;
use std::io;

use crate::catalog::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    Config,
    Io,
    Catalog,
    /// Request body is not a statement
    InvalidRequest,
}

impl CliErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "SQLPLAN_CLI_CONFIG_ERROR",
            Self::Io => "SQLPLAN_CLI_IO_ERROR",
            Self::Catalog => "SQLPLAN_CLI_CATALOG_ERROR",
            Self::InvalidRequest => "SQLPLAN_CLI_INVALID_REQUEST",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::Config, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::Io, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// A catalog snapshot that cannot be loaded is fatal for the invocation
impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        Self::new(CliErrorCode::Catalog, e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;
