//! # Collation Errors

use thiserror::Error;

/// Result type for collation operations
pub type CollationResult<T> = Result<T, CollationError>;

/// Collation lookup, comparison and key decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollationError {
    /// The collation cannot reconstruct values from its sort keys
    #[error("{collation} does not support {operation}: sort keys are not recoverable")]
    UnsupportedOperation {
        collation: String,
        operation: &'static str,
    },

    /// No collation registered under this id or name
    #[error("Unknown collation '{0}'")]
    UnknownCollation(String),

    /// Key bytes do not decode as expected
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// A non-string value was handed to a string collation
    #[error("{collation} cannot order a {type_name} value")]
    NotAString {
        collation: String,
        type_name: &'static str,
    },
}
