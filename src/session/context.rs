//! Per-session compilation context

use uuid::Uuid;

use super::views::ViewRegistry;

/// Default schema used when none is configured
pub const DEFAULT_SCHEMA: &str = "test";

/// Everything about a session the compiler reads besides the catalog
#[derive(Debug, Clone)]
pub struct SessionContext {
    session_id: Uuid,
    default_schema: String,
    views: ViewRegistry,
}

impl SessionContext {
    pub fn new(default_schema: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            default_schema: default_schema.into(),
            views: ViewRegistry::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Schema for unqualified table names
    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA)
    }
}
