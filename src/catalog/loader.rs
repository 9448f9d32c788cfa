//! Catalog snapshot loader
//!
//! A snapshot is one JSON document:
//!
//! ```json
//! {"schemas": [{"name": "test", "tables": [{
//!     "name": "t",
//!     "columns": [{"name": "a", "type": "integer"},
//!                 {"name": "s", "type": "varchar", "collation": "en_us_ci"}],
//!     "indexes": [{"name": "t_as", "columns": ["a", "s"]}]
//! }]}]}
//! ```
//!
//! Collations are referenced by name and resolved through the registry.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::catalog::Catalog;
use super::errors::{CatalogError, CatalogResult};
use super::types::{Column, TableName};
use crate::collation;
use crate::observability::{log_event, Event, Severity};
use crate::sql::ColumnDef;

#[derive(Debug, Deserialize)]
struct SnapshotDef {
    #[serde(default)]
    schemas: Vec<SchemaDef>,
}

#[derive(Debug, Deserialize)]
struct SchemaDef {
    name: String,
    #[serde(default)]
    tables: Vec<TableDef>,
}

#[derive(Debug, Deserialize)]
struct TableDef {
    name: String,
    columns: Vec<ColumnDef>,
    #[serde(default)]
    indexes: Vec<IndexDef>,
}

#[derive(Debug, Deserialize)]
struct IndexDef {
    name: String,
    columns: Vec<String>,
    #[serde(default)]
    unique: bool,
}

/// Loads a catalog snapshot file
pub fn load_catalog(path: &Path) -> CatalogResult<Catalog> {
    let content = fs::read_to_string(path).map_err(|e| {
        CatalogError::Malformed(format!("failed to read {}: {}", path.display(), e))
    })?;
    let catalog = catalog_from_json(&content)?;

    let path_str = path.display().to_string();
    let tables = catalog.tables().count().to_string();
    log_event(
        Severity::Info,
        Event::CatalogLoaded,
        &[("path", &path_str), ("tables", &tables)],
    );
    Ok(catalog)
}

/// Builds a catalog from snapshot JSON
pub fn catalog_from_json(json: &str) -> CatalogResult<Catalog> {
    let snapshot: SnapshotDef =
        serde_json::from_str(json).map_err(|e| CatalogError::Malformed(e.to_string()))?;

    let mut catalog = Catalog::new();
    for schema in snapshot.schemas {
        catalog.create_schema(&schema.name)?;
        for table in schema.tables {
            let name = TableName::new(schema.name.clone(), table.name);
            let columns = table
                .columns
                .into_iter()
                .map(column_from_def)
                .collect::<CatalogResult<Vec<_>>>()?;
            catalog.create_table(name.clone(), columns)?;
            for index in table.indexes {
                catalog.create_index(&name, &index.name, &index.columns, index.unique)?;
            }
        }
    }
    Ok(catalog)
}

/// Builds a column, resolving its collation name through the registry
pub(crate) fn column_from_def(def: ColumnDef) -> CatalogResult<Column> {
    let mut column = Column::new(def.name, def.data_type);
    column.nullable = def.nullable;
    if let Some(name) = def.collation {
        if !def.data_type.is_string() {
            return Err(CatalogError::Malformed(format!(
                "column '{}' is {} and cannot carry a collation",
                column.name, def.data_type
            )));
        }
        let collator =
            collation::by_name(&name).map_err(|e| CatalogError::Malformed(e.to_string()))?;
        column.collation = Some(collator.collation_id());
    }
    Ok(column)
}
