//! Parsed statement model
//!
//! The tokenizer and parser live outside this crate. They hand the compiler
//! a [`Statement`] tree, which is also deserializable from JSON so a
//! statement can be fed to the CLI directly.
//!
//! # Example
//!
//! ```json
//! {"kind": "select",
//!  "columns": [{"kind": "expr", "expr": {"kind": "column", "name": "a"}, "alias": "x"}],
//!  "from": [{"name": {"name": "t"}}],
//!  "where": {"kind": "binary", "op": "eq",
//!            "left": {"kind": "column", "name": "b"},
//!            "right": {"kind": "parameter", "index": 0}}}
//! ```

mod ast;

pub use ast::{
    Assignment, BinaryOp, ColumnDef, DeleteStatement, Expr, InsertSource, InsertStatement,
    ObjectName, OrderByItem, SelectItem, SelectStatement, Statement, StatementCategory,
    TableRef, UpdateStatement,
};
