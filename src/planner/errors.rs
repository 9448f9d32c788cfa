//! Planner error types
//!
//! Error codes:
//! - PLAN_INVALID_ARGUMENT (structural)
//! - PLAN_NON_LEADING_FIELD (structural)
//! - PLAN_MISMATCHED_BOUNDS (structural)
//! - PLAN_UNKNOWN_SCHEMA (resolution)
//! - PLAN_UNKNOWN_TABLE (resolution)
//! - PLAN_UNKNOWN_COLUMN (resolution)
//! - PLAN_AMBIGUOUS_COLUMN (resolution)
//! - PLAN_RECURSIVE_VIEW (resolution)
//! - PLAN_TYPE_MISMATCH (resolution)
//! - PLAN_INVALID_STATEMENT (resolution)
//! - PLAN_UNSUPPORTED (feature gap)
//!
//! None of them are retryable: the same input always fails the same way.

use std::fmt;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Statement rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Broad error class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A key range violates the index's structure
    Structural,
    /// A name or type does not resolve
    Resolution,
    /// The statement kind is recognized but not implemented
    FeatureGap,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Structural => "structural",
            ErrorCategory::Resolution => "resolution",
            ErrorCategory::FeatureGap => "feature gap",
        }
    }
}

/// Planner error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// A required range bound was absent
    InvalidArgument,
    /// A bound selects a field after an unselected one
    NonLeadingField,
    /// Low and high bounds select different fields
    MismatchedBounds,
    UnknownSchema,
    UnknownTable,
    UnknownColumn,
    /// Unqualified column found in more than one source
    AmbiguousColumn,
    /// A view expands into itself
    RecursiveView,
    TypeMismatch,
    /// Well-formed statement with inconsistent parts
    InvalidStatement,
    Unsupported,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::InvalidArgument => "PLAN_INVALID_ARGUMENT",
            PlannerErrorCode::NonLeadingField => "PLAN_NON_LEADING_FIELD",
            PlannerErrorCode::MismatchedBounds => "PLAN_MISMATCHED_BOUNDS",
            PlannerErrorCode::UnknownSchema => "PLAN_UNKNOWN_SCHEMA",
            PlannerErrorCode::UnknownTable => "PLAN_UNKNOWN_TABLE",
            PlannerErrorCode::UnknownColumn => "PLAN_UNKNOWN_COLUMN",
            PlannerErrorCode::AmbiguousColumn => "PLAN_AMBIGUOUS_COLUMN",
            PlannerErrorCode::RecursiveView => "PLAN_RECURSIVE_VIEW",
            PlannerErrorCode::TypeMismatch => "PLAN_TYPE_MISMATCH",
            PlannerErrorCode::InvalidStatement => "PLAN_INVALID_STATEMENT",
            PlannerErrorCode::Unsupported => "PLAN_UNSUPPORTED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PlannerErrorCode::InvalidArgument
            | PlannerErrorCode::NonLeadingField
            | PlannerErrorCode::MismatchedBounds => ErrorCategory::Structural,
            PlannerErrorCode::UnknownSchema
            | PlannerErrorCode::UnknownTable
            | PlannerErrorCode::UnknownColumn
            | PlannerErrorCode::AmbiguousColumn
            | PlannerErrorCode::RecursiveView
            | PlannerErrorCode::TypeMismatch
            | PlannerErrorCode::InvalidStatement => ErrorCategory::Resolution,
            PlannerErrorCode::Unsupported => ErrorCategory::FeatureGap,
        }
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerError {
    /// Error code
    code: PlannerErrorCode,
    /// Human-readable message
    message: String,
    /// Offending identifier, for resolution errors
    identifier: Option<String>,
}

impl PlannerError {
    fn new(code: PlannerErrorCode, message: String, identifier: Option<String>) -> Self {
        Self {
            code,
            message,
            identifier,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::new(PlannerErrorCode::InvalidArgument, reason.into(), None)
    }

    /// Create a non-leading field error for the field at `position`
    pub fn non_leading_field(index: &str, position: usize) -> Self {
        Self::new(
            PlannerErrorCode::NonLeadingField,
            format!(
                "Bound on field {} of index {} does not follow a bound leading field",
                position, index
            ),
            None,
        )
    }

    /// Create a mismatched bounds error for the field at `position`
    pub fn mismatched_bounds(index: &str, position: usize) -> Self {
        Self::new(
            PlannerErrorCode::MismatchedBounds,
            format!(
                "Low and high bounds of index {} disagree on field {}",
                index, position
            ),
            None,
        )
    }

    pub fn unknown_schema(schema: impl Into<String>) -> Self {
        let s = schema.into();
        Self::new(
            PlannerErrorCode::UnknownSchema,
            format!("Schema '{}' not found", s),
            Some(s),
        )
    }

    pub fn unknown_table(table: impl Into<String>) -> Self {
        let t = table.into();
        Self::new(
            PlannerErrorCode::UnknownTable,
            format!("Table '{}' not found", t),
            Some(t),
        )
    }

    pub fn unknown_column(column: impl Into<String>) -> Self {
        let c = column.into();
        Self::new(
            PlannerErrorCode::UnknownColumn,
            format!("Column '{}' not found", c),
            Some(c),
        )
    }

    pub fn ambiguous_column(column: impl Into<String>) -> Self {
        let c = column.into();
        Self::new(
            PlannerErrorCode::AmbiguousColumn,
            format!("Column '{}' is ambiguous", c),
            Some(c),
        )
    }

    pub fn recursive_view(view: impl Into<String>) -> Self {
        let v = view.into();
        Self::new(
            PlannerErrorCode::RecursiveView,
            format!("View '{}' refers to itself", v),
            Some(v),
        )
    }

    /// Create a type mismatch error for the expression text `expr`
    pub fn type_mismatch(expr: impl Into<String>, reason: impl fmt::Display) -> Self {
        let e = expr.into();
        Self::new(
            PlannerErrorCode::TypeMismatch,
            format!("Type mismatch in '{}': {}", e, reason),
            Some(e),
        )
    }

    pub fn invalid_statement(reason: impl Into<String>) -> Self {
        Self::new(PlannerErrorCode::InvalidStatement, reason.into(), None)
    }

    /// Create a feature-gap error echoing the statement text
    pub fn unsupported(statement_text: impl fmt::Display) -> Self {
        Self::new(
            PlannerErrorCode::Unsupported,
            format!("{} not supported yet", statement_text),
            None,
        )
    }

    /// Feature-gap error for parameters on a statement that takes none
    pub fn parameters_unsupported() -> Self {
        Self::new(
            PlannerErrorCode::Unsupported,
            "Parameters not supported".to_string(),
            None,
        )
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending identifier if applicable
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
