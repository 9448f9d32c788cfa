//! In-memory catalog snapshot
//!
//! Tables are held behind `Arc` so a snapshot clones cheaply. Mutation
//! happens on a private copy which the owner then swaps in; readers holding
//! the previous `Arc<Catalog>` keep a stable view.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::{CatalogError, CatalogResult};
use super::types::{Column, Index, IndexField, Table, TableName};

/// Read-only schema view consumed by the compiler
pub trait CatalogView {
    /// Check if a schema exists
    fn schema_exists(&self, schema: &str) -> bool;
    /// Look up a table; names match case-insensitively
    fn table(&self, name: &TableName) -> Option<Arc<Table>>;
}

#[derive(Debug, Clone, Default)]
struct SchemaEntry {
    name: String,
    tables: BTreeMap<String, Arc<Table>>,
}

/// Catalog of schemas, tables and indexes
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schemas: BTreeMap<String, SchemaEntry>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared schema names, sorted case-insensitively
    pub fn schema_names(&self) -> Vec<&str> {
        self.schemas.values().map(|s| s.name.as_str()).collect()
    }

    /// All tables in schema then table order
    pub fn tables(&self) -> impl Iterator<Item = &Arc<Table>> {
        self.schemas.values().flat_map(|s| s.tables.values())
    }

    pub fn create_schema(&mut self, name: &str) -> CatalogResult<()> {
        if self.schemas.contains_key(&key(name)) {
            return Err(CatalogError::DuplicateSchema(name.to_string()));
        }
        self.schemas.insert(
            key(name),
            SchemaEntry {
                name: name.to_string(),
                tables: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Drops an empty schema
    pub fn drop_schema(&mut self, name: &str) -> CatalogResult<()> {
        let entry = self
            .schemas
            .get(&key(name))
            .ok_or_else(|| CatalogError::UnknownSchema(name.to_string()))?;
        if !entry.tables.is_empty() {
            return Err(CatalogError::SchemaNotEmpty(entry.name.clone()));
        }
        self.schemas.remove(&key(name));
        Ok(())
    }

    pub fn create_table(
        &mut self,
        name: TableName,
        columns: Vec<Column>,
    ) -> CatalogResult<Arc<Table>> {
        let schema = self
            .schemas
            .get_mut(&key(&name.schema))
            .ok_or_else(|| CatalogError::UnknownSchema(name.schema.clone()))?;
        if schema.tables.contains_key(&key(&name.table)) {
            return Err(CatalogError::DuplicateTable(name.to_string()));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(CatalogError::DuplicateColumn {
                    table: name.to_string(),
                    column: column.name.clone(),
                });
            }
        }

        // Qualify with the schema's declared spelling
        let name = TableName::new(schema.name.clone(), name.table);
        let table = Arc::new(Table::new(name.clone(), columns));
        schema.tables.insert(key(&name.table), Arc::clone(&table));
        Ok(table)
    }

    pub fn drop_table(&mut self, name: &TableName) -> CatalogResult<()> {
        let schema = self
            .schemas
            .get_mut(&key(&name.schema))
            .ok_or_else(|| CatalogError::UnknownSchema(name.schema.clone()))?;
        schema
            .tables
            .remove(&key(&name.table))
            .map(|_| ())
            .ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
    }

    /// Declares an index over `columns`, in the given order
    pub fn create_index(
        &mut self,
        table: &TableName,
        index_name: &str,
        columns: &[String],
        unique: bool,
    ) -> CatalogResult<Arc<Index>> {
        if columns.is_empty() {
            return Err(CatalogError::EmptyIndex(index_name.to_string()));
        }
        let schema = self
            .schemas
            .get_mut(&key(&table.schema))
            .ok_or_else(|| CatalogError::UnknownSchema(table.schema.clone()))?;
        let entry = schema
            .tables
            .get_mut(&key(&table.table))
            .ok_or_else(|| CatalogError::UnknownTable(table.to_string()))?;
        if entry.index(index_name).is_some() {
            return Err(CatalogError::DuplicateIndex(index_name.to_string()));
        }

        let mut fields = Vec::with_capacity(columns.len());
        for (position, column_name) in columns.iter().enumerate() {
            let (column_position, column) =
                entry
                    .column(column_name)
                    .ok_or_else(|| CatalogError::UnknownColumn {
                        table: entry.name.to_string(),
                        column: column_name.clone(),
                    })?;
            fields.push(IndexField {
                position,
                column: column.name.clone(),
                column_position,
                data_type: column.data_type,
                collation: column.collation,
            });
        }

        let index = Arc::new(Index {
            name: index_name.to_string(),
            table: entry.name.clone(),
            unique,
            fields,
        });
        Arc::make_mut(entry).indexes.push(Arc::clone(&index));
        Ok(index)
    }

    pub fn drop_index(&mut self, table: &TableName, index_name: &str) -> CatalogResult<()> {
        let schema = self
            .schemas
            .get_mut(&key(&table.schema))
            .ok_or_else(|| CatalogError::UnknownSchema(table.schema.clone()))?;
        let entry = schema
            .tables
            .get_mut(&key(&table.table))
            .ok_or_else(|| CatalogError::UnknownTable(table.to_string()))?;
        if entry.index(index_name).is_none() {
            return Err(CatalogError::UnknownIndex(index_name.to_string()));
        }
        Arc::make_mut(entry)
            .indexes
            .retain(|i| !i.name.eq_ignore_ascii_case(index_name));
        Ok(())
    }
}

impl CatalogView for Catalog {
    fn schema_exists(&self, schema: &str) -> bool {
        self.schemas.contains_key(&key(schema))
    }

    fn table(&self, name: &TableName) -> Option<Arc<Table>> {
        self.schemas
            .get(&key(&name.schema))?
            .tables
            .get(&key(&name.table))
            .cloned()
    }
}
