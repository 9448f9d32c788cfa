//! Session-local view definitions
//!
//! Views are stored as their parsed defining query and expanded like a
//! macro at every reference.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::{CatalogError, CatalogResult};
use crate::sql::{SelectStatement, Statement};

/// A named, parameter-free SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefinition {
    name: String,
    /// Optional column renames, one per result column
    columns: Vec<String>,
    query: SelectStatement,
}

impl ViewDefinition {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        query: SelectStatement,
    ) -> CatalogResult<Self> {
        let name = name.into();
        if Statement::Select(query.clone()).parameter_count() > 0 {
            return Err(CatalogError::ParameterizedView(name));
        }
        Ok(Self {
            name,
            columns,
            query,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn query(&self) -> &SelectStatement {
        &self.query
    }
}

/// Views visible to one session, keyed case-insensitively
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: BTreeMap<String, Arc<ViewDefinition>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_view(&mut self, view: ViewDefinition) -> CatalogResult<()> {
        let key = view.name.to_lowercase();
        if self.views.contains_key(&key) {
            return Err(CatalogError::DuplicateView(view.name));
        }
        self.views.insert(key, Arc::new(view));
        Ok(())
    }

    pub fn remove_view(&mut self, name: &str) -> CatalogResult<Arc<ViewDefinition>> {
        self.views
            .remove(&name.to_lowercase())
            .ok_or_else(|| CatalogError::UnknownView(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ViewDefinition>> {
        self.views.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
