//! Catalog view
//!
//! A read-only snapshot of schemas, tables, columns and indexes. String
//! columns carry the id of the collation that orders them.
//!
//! The compiler only reads a snapshot through [`CatalogView`]. Mutation is
//! done by the DDL dispatcher on a private copy which is then swapped in.

mod catalog;
mod errors;
mod loader;
mod types;
mod value;

pub use catalog::{Catalog, CatalogView};
pub use errors::{CatalogError, CatalogResult};
pub use loader::{catalog_from_json, load_catalog};
pub(crate) use loader::column_from_def;
pub use types::{Column, DataType, Index, IndexField, Table, TableName};
pub use value::Value;
