//! Plan compiler
//!
//! Turns a parsed statement into a typed operator plan:
//!
//! ```text
//! Statement -> Binder -> TypeResolver -> index range derivation -> CompiledPlan
//! ```
//!
//! # Design Principles
//!
//! - Deterministic: same statement, snapshot and hints give the same plan
//! - No costing: index choice follows fixed rules
//! - One plan or none: failures never leave partial state
//!
//! # Index Selection (strict order)
//!
//! 1. Most bound leading fields
//! 2. Most equality fields
//! 3. Smallest index name

mod binder;
mod compiler;
mod errors;
mod explain;
mod index_scan;
mod plan;
mod range;
mod typer;

pub use binder::{
    Binder, BoundColumn, BoundExpr, BoundSelect, BoundSource, ProjectItem, SortKey, SourceColumn,
    SourceKind,
};
pub use compiler::{OperatorCompiler, MAX_PARAMETERS};
pub use errors::{ErrorCategory, PlannerError, PlannerErrorCode, PlannerResult, Severity};
pub use explain::{ExplainPlan, ExplainStatus};
pub use plan::{CompiledPlan, Generated, Operator, ResultColumn, TargetColumn};
pub use range::{BoundValue, ColumnSelector, FieldSelector, IndexBound, IndexKeyRange, LeadingFields};
pub use typer::TypeResolver;
