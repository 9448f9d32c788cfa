//! Sessions
//!
//! A session pairs an explicit [`SessionContext`] (id, default schema, view
//! registry) with the catalog snapshot its statements compile against.
//! Compilation only reads; DDL replaces the snapshot between calls.

mod context;
mod ddl;
mod views;

use std::sync::Arc;

pub use context::{SessionContext, DEFAULT_SCHEMA};
pub use ddl::{DdlDispatcher, SessionError};
pub use views::{ViewDefinition, ViewRegistry};

use crate::catalog::{Catalog, DataType};
use crate::planner::{Generated, OperatorCompiler, PlannerResult};
use crate::sql::Statement;

#[derive(Debug, Clone)]
pub struct Session {
    context: SessionContext,
    catalog: Arc<Catalog>,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>, default_schema: impl Into<String>) -> Self {
        Self::with_context(catalog, SessionContext::new(default_schema))
    }

    pub fn with_context(catalog: Arc<Catalog>, context: SessionContext) -> Self {
        Self { context, catalog }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Current catalog snapshot
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Compiler over the current snapshot
    pub fn compiler(&self) -> OperatorCompiler<'_, Catalog> {
        OperatorCompiler::new(self.catalog.as_ref(), &self.context)
    }

    pub fn compile(
        &self,
        statement: &Statement,
        parameter_hints: &[Option<DataType>],
    ) -> PlannerResult<Generated> {
        self.compiler().generate(statement, parameter_hints)
    }

    pub fn execute_ddl(&mut self, statement: &Statement) -> Result<(), SessionError> {
        DdlDispatcher::execute(self, statement)
    }

    /// Compiles `statement`, applying it through DDL dispatch when the
    /// compiler reports it as not applicable. DDL with parameter hints is
    /// rejected.
    pub fn execute(
        &mut self,
        statement: &Statement,
        parameter_hints: &[Option<DataType>],
    ) -> Result<Generated, SessionError> {
        let generated = self.compile(statement, parameter_hints)?;
        if let Generated::NotApplicable = generated {
            DdlDispatcher::execute_with_hints(self, statement, parameter_hints)?;
        }
        Ok(generated)
    }
}
