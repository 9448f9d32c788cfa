//! DDL dispatch
//!
//! Schema, table and index changes are applied to a private copy of the
//! catalog, which then replaces the session's snapshot. Plans compiled
//! earlier keep the snapshot they were compiled against. View changes only
//! touch the session's view registry.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{column_from_def, Catalog, CatalogError, CatalogResult, DataType, TableName};
use crate::observability::{log_event, Event, Severity};
use crate::planner::PlannerError;
use crate::sql::{ObjectName, Statement, StatementCategory};

use super::views::ViewDefinition;
use super::Session;

/// Errors from executing a statement in a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("{0} is not a DDL statement")]
    NotDdl(String),
}

/// Applies schema-modifying statements to a session
pub struct DdlDispatcher;

impl DdlDispatcher {
    pub fn execute(session: &mut Session, statement: &Statement) -> Result<(), SessionError> {
        Self::execute_with_hints(session, statement, &[])
    }

    /// Like [`DdlDispatcher::execute`], but rejects any parameter hints:
    /// DDL statements take no parameters
    pub fn execute_with_hints(
        session: &mut Session,
        statement: &Statement,
        parameter_hints: &[Option<DataType>],
    ) -> Result<(), SessionError> {
        let text = statement.statement_text();
        let session_id = session.context.session_id().to_string();
        match Self::apply(session, statement, parameter_hints) {
            Ok(()) => {
                log_event(
                    Severity::Info,
                    Event::DdlApplied,
                    &[("session_id", &session_id), ("statement", &text)],
                );
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                log_event(
                    Severity::Warn,
                    Event::DdlRejected,
                    &[
                        ("reason", &reason),
                        ("session_id", &session_id),
                        ("statement", &text),
                    ],
                );
                Err(err)
            }
        }
    }

    fn apply(
        session: &mut Session,
        statement: &Statement,
        parameter_hints: &[Option<DataType>],
    ) -> Result<(), SessionError> {
        match statement.category() {
            StatementCategory::Dml => {
                return Err(SessionError::NotDdl(statement.statement_text()));
            }
            StatementCategory::Unsupported => {
                return Err(PlannerError::unsupported(statement.statement_text()).into());
            }
            StatementCategory::Ddl => {}
        }
        if !parameter_hints.is_empty() {
            return Err(PlannerError::parameters_unsupported().into());
        }

        let default_schema = session.context.default_schema().to_string();
        let qualify = |name: &ObjectName| {
            TableName::new(
                name.schema.clone().unwrap_or_else(|| default_schema.clone()),
                name.name.clone(),
            )
        };

        match statement {
            Statement::CreateSchema { name } => {
                copy_on_write(session, |catalog| catalog.create_schema(name))?;
            }
            Statement::DropSchema { name } => {
                copy_on_write(session, |catalog| catalog.drop_schema(name))?;
            }
            Statement::CreateTable { table, columns } => {
                let name = qualify(table);
                let columns = columns
                    .iter()
                    .cloned()
                    .map(column_from_def)
                    .collect::<CatalogResult<Vec<_>>>()?;
                copy_on_write(session, |catalog| {
                    catalog.create_table(name, columns).map(|_| ())
                })?;
            }
            Statement::DropTable { table } => {
                let name = qualify(table);
                copy_on_write(session, |catalog| catalog.drop_table(&name))?;
            }
            Statement::CreateIndex {
                name,
                table,
                columns,
                unique,
            } => {
                let table = qualify(table);
                copy_on_write(session, |catalog| {
                    catalog
                        .create_index(&table, name, columns, *unique)
                        .map(|_| ())
                })?;
            }
            Statement::DropIndex { name, table } => {
                let table = qualify(table);
                copy_on_write(session, |catalog| catalog.drop_index(&table, name))?;
            }
            Statement::CreateView {
                name,
                columns,
                query,
            } => {
                let view = ViewDefinition::new(name.clone(), columns.clone(), query.clone())?;
                session.context.views_mut().add_view(view)?;
            }
            Statement::DropView { name } => {
                session.context.views_mut().remove_view(name)?;
            }
            other => return Err(SessionError::NotDdl(other.statement_text())),
        }
        Ok(())
    }
}

/// Mutates a copy of the session's catalog and swaps it in on success
fn copy_on_write(
    session: &mut Session,
    change: impl FnOnce(&mut Catalog) -> CatalogResult<()>,
) -> CatalogResult<()> {
    let mut next = Catalog::clone(&session.catalog);
    change(&mut next)?;
    session.catalog = Arc::new(next);
    Ok(())
}
