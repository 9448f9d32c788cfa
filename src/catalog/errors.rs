//! # Catalog Errors
//!
//! Errors raised while mutating or loading a catalog snapshot.

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog mutation and loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    // ==================
    // Schema Errors
    // ==================
    #[error("Schema '{0}' already exists")]
    DuplicateSchema(String),

    #[error("Schema '{0}' does not exist")]
    UnknownSchema(String),

    #[error("Schema '{0}' is not empty")]
    SchemaNotEmpty(String),

    // ==================
    // Table Errors
    // ==================
    #[error("Table '{0}' already exists")]
    DuplicateTable(String),

    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    #[error("Column '{column}' declared twice in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    // ==================
    // Index Errors
    // ==================
    #[error("Index '{0}' already exists")]
    DuplicateIndex(String),

    #[error("Index '{0}' must declare at least one column")]
    EmptyIndex(String),

    #[error("Index '{0}' does not exist")]
    UnknownIndex(String),

    // ==================
    // View Errors
    // ==================
    #[error("View '{0}' already exists")]
    DuplicateView(String),

    #[error("View '{0}' does not exist")]
    UnknownView(String),

    #[error("View '{0}' must not contain parameters")]
    ParameterizedView(String),

    // ==================
    // Snapshot Errors
    // ==================
    #[error("Malformed catalog snapshot: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_object() {
        let err = CatalogError::UnknownColumn {
            table: "test.t".into(),
            column: "zz".into(),
        };
        assert_eq!(err.to_string(), "Column 'zz' does not exist in table 'test.t'");
        assert!(CatalogError::DuplicateIndex("i1".into()).to_string().contains("i1"));
    }
}
