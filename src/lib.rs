//! sqlplan - a deterministic SQL-to-plan compiler core
//!
//! - `sql`: the parsed statement model handed over by the parser
//! - `catalog`: read-only schema snapshots and their JSON loader
//! - `collation`: string orderings and composite sort keys
//! - `planner`: binding, typing, index range derivation and plan assembly
//! - `session`: per-session context, views and DDL dispatch
//! - `cli`: the `sqlplan` binary's commands

pub mod catalog;
pub mod cli;
pub mod collation;
pub mod observability;
pub mod planner;
pub mod session;
pub mod sql;
