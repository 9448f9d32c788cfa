//! Plan compiler
//!
//! Orchestrates binding, type resolution and index range derivation into a
//! [`CompiledPlan`]. Compilation is a pure function of the statement, the
//! catalog snapshot, the session context and the parameter hints.
//!
//! # Statement handling
//!
//! - SELECT, INSERT, UPDATE, DELETE: compiled
//! - CREATE/DROP SCHEMA, TABLE, INDEX and VIEW: [`Generated::NotApplicable`],
//!   the DDL dispatcher applies them
//! - ALTER TABLE, RENAME, REVOKE: rejected as not supported

use std::sync::Arc;

use crate::catalog::{CatalogView, DataType, Table};
use crate::observability::{log_event, Event, Logger, Severity};
use crate::session::SessionContext;
use crate::sql::{
    DeleteStatement, Expr, InsertSource, InsertStatement, Statement, StatementCategory,
    UpdateStatement,
};

use super::binder::{Binder, BoundExpr, BoundSelect, BoundSource, SourceKind};
use super::errors::{PlannerError, PlannerResult};
use super::index_scan;
use super::plan::{CompiledPlan, Generated, Operator, ResultColumn, TargetColumn};
use super::typer::TypeResolver;

/// Highest number of positional parameters a statement may use
pub const MAX_PARAMETERS: usize = u16::MAX as usize;

/// Compiles statements for one session against one catalog snapshot
pub struct OperatorCompiler<'a, C: CatalogView + ?Sized> {
    catalog: &'a C,
    session: &'a SessionContext,
}

impl<'a, C: CatalogView + ?Sized> OperatorCompiler<'a, C> {
    pub fn new(catalog: &'a C, session: &'a SessionContext) -> Self {
        Self { catalog, session }
    }

    /// Compiles `statement`, or reports that DDL dispatch handles it.
    ///
    /// `parameter_hints` gives caller-known parameter types by position; a
    /// hint takes precedence over the type implied by context.
    pub fn generate(
        &self,
        statement: &Statement,
        parameter_hints: &[Option<DataType>],
    ) -> PlannerResult<Generated> {
        let text = statement.statement_text();
        let session_id = self.session.session_id().to_string();
        match statement.category() {
            StatementCategory::Ddl => {
                log_event(
                    Severity::Trace,
                    Event::PlanNotApplicable,
                    &[("session_id", &session_id), ("statement", &text)],
                );
                return Ok(Generated::NotApplicable);
            }
            StatementCategory::Unsupported => {
                let err = PlannerError::unsupported(&text);
                self.log_rejected(&session_id, &text, &err);
                return Err(err);
            }
            StatementCategory::Dml => {}
        }

        match self.compile(statement, parameter_hints) {
            Ok(plan) => {
                if Logger::enabled(Severity::Trace) {
                    let operator = plan.root.to_string();
                    log_event(
                        Severity::Trace,
                        Event::PlanCompiled,
                        &[
                            ("kind", plan.kind()),
                            ("operator", &operator),
                            ("session_id", &session_id),
                            ("statement", &text),
                        ],
                    );
                }
                Ok(Generated::Plan(plan))
            }
            Err(err) => {
                self.log_rejected(&session_id, &text, &err);
                Err(err)
            }
        }
    }

    fn log_rejected(&self, session_id: &str, text: &str, err: &PlannerError) {
        log_event(
            Severity::Warn,
            Event::PlanRejected,
            &[
                ("code", err.code().code()),
                ("reason", err.message()),
                ("session_id", session_id),
                ("statement", text),
            ],
        );
    }

    fn compile(
        &self,
        statement: &Statement,
        parameter_hints: &[Option<DataType>],
    ) -> PlannerResult<CompiledPlan> {
        let count = statement.parameter_count();
        if count > MAX_PARAMETERS {
            return Err(PlannerError::invalid_statement(format!(
                "Parameter index {} exceeds the limit of {} parameters",
                count - 1,
                MAX_PARAMETERS
            )));
        }
        let mut typer = TypeResolver::new(count, parameter_hints);
        let mut binder = Binder::new(self.catalog, self.session);

        let (root, result_columns, offset, limit) = match statement {
            Statement::Select(select) => {
                let bound = binder.bind_select(select)?;
                let (root, columns) = self.query(&bound, &mut typer)?;
                (root, columns, bound.offset, bound.limit)
            }
            Statement::Insert(insert) => {
                (self.insert(&mut binder, insert, &mut typer)?, Vec::new(), None, None)
            }
            Statement::Update(update) => {
                (self.update(&binder, update, &mut typer)?, Vec::new(), None, None)
            }
            Statement::Delete(delete) => {
                (self.delete(&binder, delete, &mut typer)?, Vec::new(), None, None)
            }
            other => {
                return Err(PlannerError::invalid_statement(format!(
                    "{} is not a data manipulation statement",
                    other.statement_text()
                )))
            }
        };

        Ok(CompiledPlan {
            statement_text: statement.statement_text(),
            is_modify: root.is_update_capable(),
            root,
            result_columns,
            parameter_types: typer.into_parameter_types(),
            offset,
            limit,
        })
    }

    /// Operator tree and output columns of a bound SELECT
    fn query(
        &self,
        select: &BoundSelect,
        typer: &mut TypeResolver,
    ) -> PlannerResult<(Operator, Vec<ResultColumn>)> {
        if let Some(predicate) = &select.where_clause {
            typer.resolve_predicate(predicate)?;
        }
        let mut result_columns = Vec::with_capacity(select.projection.len());
        for item in &select.projection {
            result_columns.push(ResultColumn {
                name: item.name.clone(),
                data_type: typer.resolve(&item.expr)?,
            });
        }
        for key in &select.order_by {
            typer.resolve(&key.expr)?;
        }

        let conjuncts = select
            .where_clause
            .as_ref()
            .map(|w| w.conjuncts())
            .unwrap_or_default();
        let mut inputs = select
            .sources
            .iter()
            .enumerate()
            .map(|(i, source)| self.source_operator(i, source, &conjuncts))
            .collect::<PlannerResult<Vec<_>>>()?;

        let mut root = match inputs.len() {
            0 => Operator::Values {
                rows: vec![Vec::new()],
            },
            1 => inputs.remove(0),
            _ => Operator::Product { inputs },
        };
        if let Some(predicate) = &select.where_clause {
            root = Operator::Filter {
                input: Box::new(root),
                predicate: predicate.clone(),
            };
        }
        if !select.order_by.is_empty() {
            root = Operator::Sort {
                input: Box::new(root),
                keys: select.order_by.clone(),
            };
        }
        let root = Operator::Project {
            input: Box::new(root),
            columns: select.projection.clone(),
        };
        Ok((root, result_columns))
    }

    fn source_operator(
        &self,
        index: usize,
        source: &BoundSource,
        conjuncts: &[&BoundExpr],
    ) -> PlannerResult<Operator> {
        match &source.kind {
            SourceKind::Table(table) => table_access(table, index, conjuncts),
            SourceKind::View { query, .. } => {
                // View bodies carry no parameters
                let mut typer = TypeResolver::new(0, &[]);
                Ok(self.query(query, &mut typer)?.0)
            }
        }
    }

    fn insert(
        &self,
        binder: &mut Binder<'a, C>,
        insert: &InsertStatement,
        typer: &mut TypeResolver,
    ) -> PlannerResult<Operator> {
        let table = binder.bind_table(&insert.table)?;
        let targets = if insert.columns.is_empty() {
            table
                .columns
                .iter()
                .enumerate()
                .map(|(position, c)| TargetColumn {
                    position,
                    name: c.name.clone(),
                })
                .collect()
        } else {
            let mut targets: Vec<TargetColumn> = Vec::with_capacity(insert.columns.len());
            for name in &insert.columns {
                let target = target_column(&table, name)?;
                if targets.iter().any(|t| t.position == target.position) {
                    return Err(PlannerError::invalid_statement(format!(
                        "Column '{}' specified more than once",
                        target.name
                    )));
                }
                targets.push(target);
            }
            targets
        };

        let input = match &insert.source {
            InsertSource::Values { rows } => {
                let mut bound_rows = Vec::with_capacity(rows.len());
                for row in rows {
                    check_arity(targets.len(), row.len())?;
                    let mut bound_row = Vec::with_capacity(row.len());
                    for (target, expr) in targets.iter().zip(row) {
                        let bound = binder.bind_expr(expr, &[])?;
                        typer.expect(&bound, Some(table.columns[target.position].data_type))?;
                        bound_row.push(bound);
                    }
                    bound_rows.push(bound_row);
                }
                Operator::Values { rows: bound_rows }
            }
            InsertSource::Select { query } => {
                let bound = binder.bind_select(query)?;
                let (root, columns) = self.query(&bound, typer)?;
                check_arity(targets.len(), columns.len())?;
                for (target, column) in targets.iter().zip(&columns) {
                    let expected = table.columns[target.position].data_type;
                    if let Some(actual) = column.data_type {
                        if !actual.comparable_with(&expected) {
                            return Err(PlannerError::type_mismatch(
                                target.name.clone(),
                                format!("cannot assign {} to {}", actual, expected),
                            ));
                        }
                    }
                }
                root
            }
        };

        Ok(Operator::Insert {
            table: table.name.clone(),
            columns: targets,
            input: Box::new(input),
        })
    }

    fn update(
        &self,
        binder: &Binder<'a, C>,
        update: &UpdateStatement,
        typer: &mut TypeResolver,
    ) -> PlannerResult<Operator> {
        let table = binder.bind_table(&update.table)?;
        let scope = [BoundSource::table(Arc::clone(&table), None)];

        let mut assignments = Vec::with_capacity(update.assignments.len());
        for assignment in &update.assignments {
            let target = target_column(&table, &assignment.column)?;
            let value = binder.bind_expr(&assignment.value, &scope)?;
            typer.expect(&value, Some(table.columns[target.position].data_type))?;
            assignments.push((target, value));
        }

        let input = filtered_access(binder, &table, &scope, update.where_clause.as_ref(), typer)?;
        Ok(Operator::Update {
            table: table.name.clone(),
            assignments,
            input: Box::new(input),
        })
    }

    fn delete(
        &self,
        binder: &Binder<'a, C>,
        delete: &DeleteStatement,
        typer: &mut TypeResolver,
    ) -> PlannerResult<Operator> {
        let table = binder.bind_table(&delete.table)?;
        let scope = [BoundSource::table(Arc::clone(&table), None)];
        let input = filtered_access(binder, &table, &scope, delete.where_clause.as_ref(), typer)?;
        Ok(Operator::Delete {
            table: table.name.clone(),
            input: Box::new(input),
        })
    }
}

/// Index scan when an index applies, table scan otherwise
fn table_access(table: &Table, source: usize, conjuncts: &[&BoundExpr]) -> PlannerResult<Operator> {
    Ok(match index_scan::choose_range(table, source, conjuncts)? {
        Some(range) => Operator::IndexScan { range },
        None => Operator::TableScan {
            table: table.name.clone(),
        },
    })
}

/// Row source for UPDATE and DELETE: access path plus the full predicate
fn filtered_access<C: CatalogView + ?Sized>(
    binder: &Binder<'_, C>,
    table: &Table,
    scope: &[BoundSource],
    predicate: Option<&Expr>,
    typer: &mut TypeResolver,
) -> PlannerResult<Operator> {
    let Some(predicate) = predicate else {
        return table_access(table, 0, &[]);
    };
    let bound = binder.bind_expr(predicate, scope)?;
    typer.resolve_predicate(&bound)?;
    let access = table_access(table, 0, &bound.conjuncts())?;
    Ok(Operator::Filter {
        input: Box::new(access),
        predicate: bound,
    })
}

fn target_column(table: &Table, name: &str) -> PlannerResult<TargetColumn> {
    let (position, column) = table
        .column(name)
        .ok_or_else(|| PlannerError::unknown_column(format!("{}.{}", table.name, name)))?;
    Ok(TargetColumn {
        position,
        name: column.name.clone(),
    })
}

fn check_arity(columns: usize, values: usize) -> PlannerResult<()> {
    if columns != values {
        return Err(PlannerError::invalid_statement(format!(
            "INSERT has {} target columns but {} values",
            columns, values
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Column, TableName, Value};
    use crate::planner::errors::PlannerErrorCode;
    use crate::sql::{Assignment, ObjectName, SelectItem, SelectStatement, TableRef};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.create_schema("test").unwrap();
        let name = TableName::new("test", "t");
        catalog
            .create_table(
                name.clone(),
                vec![
                    Column::new("a", DataType::BigInt).not_null(),
                    Column::new("b", DataType::Integer),
                    Column::new("s", DataType::Varchar),
                ],
            )
            .unwrap();
        catalog
            .create_index(&name, "ab", &["a".to_string(), "b".to_string()], false)
            .unwrap();
        catalog
    }

    fn t() -> ObjectName {
        ObjectName::new("t")
    }

    #[test]
    fn test_select_uses_index_and_keeps_filter() {
        let catalog = catalog();
        let session = SessionContext::default();
        let compiler = OperatorCompiler::new(&catalog, &session);
        let stmt = Statement::Select(
            SelectStatement::star_from(t())
                .with_where(Expr::eq(Expr::column("a"), Expr::param(0))),
        );
        let plan = compiler.generate(&stmt, &[]).unwrap().into_plan().unwrap();
        assert!(!plan.is_modify);
        assert_eq!(plan.parameter_types, vec![Some(DataType::BigInt)]);
        assert_eq!(
            plan.root.to_string(),
            "Project(t.a, t.b, t.s)\n  Filter(t.a = $1)\n    IndexScan(test.t.ab(a, b), (>= ($1), <= ($1)))\n"
        );
        let names: Vec<_> = plan.result_columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "s"]);
    }

    #[test]
    fn test_select_without_from() {
        let catalog = catalog();
        let session = SessionContext::default();
        let compiler = OperatorCompiler::new(&catalog, &session);
        let stmt = Statement::Select(SelectStatement {
            columns: vec![SelectItem::Expr {
                expr: Expr::literal(1),
                alias: None,
                default_name: Some("?column?".into()),
            }],
            ..SelectStatement::default()
        });
        let plan = compiler.generate(&stmt, &[]).unwrap().into_plan().unwrap();
        assert_eq!(plan.result_columns[0].name, "?column?");
        assert_eq!(plan.result_columns[0].data_type, Some(DataType::BigInt));
        assert!(matches!(plan.root.inputs()[0], Operator::Values { .. }));
    }

    #[test]
    fn test_insert_values() {
        let catalog = catalog();
        let session = SessionContext::default();
        let compiler = OperatorCompiler::new(&catalog, &session);
        let stmt = Statement::Insert(InsertStatement {
            table: t(),
            columns: vec!["s".into(), "a".into()],
            source: InsertSource::Values {
                rows: vec![vec![Expr::param(0), Expr::param(1)]],
            },
        });
        let plan = compiler.generate(&stmt, &[]).unwrap().into_plan().unwrap();
        assert!(plan.is_modify);
        assert!(plan.result_columns.is_empty());
        assert_eq!(
            plan.parameter_types,
            vec![Some(DataType::Varchar), Some(DataType::BigInt)]
        );

        let bad = Statement::Insert(InsertStatement {
            table: t(),
            columns: vec![],
            source: InsertSource::Values {
                rows: vec![vec![Expr::literal(1)]],
            },
        });
        let err = compiler.generate(&bad, &[]).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidStatement);
    }

    #[test]
    fn test_insert_type_mismatch() {
        let catalog = catalog();
        let session = SessionContext::default();
        let compiler = OperatorCompiler::new(&catalog, &session);
        let stmt = Statement::Insert(InsertStatement {
            table: t(),
            columns: vec!["a".into()],
            source: InsertSource::Values {
                rows: vec![vec![Expr::literal("x")]],
            },
        });
        let err = compiler.generate(&stmt, &[]).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::TypeMismatch);
    }

    #[test]
    fn test_update_and_delete() {
        let catalog = catalog();
        let session = SessionContext::default();
        let compiler = OperatorCompiler::new(&catalog, &session);
        let update = Statement::Update(UpdateStatement {
            table: t(),
            assignments: vec![Assignment {
                column: "B".into(),
                value: Expr::param(1),
            }],
            where_clause: Some(Expr::eq(Expr::column("a"), Expr::param(0))),
        });
        let plan = compiler.generate(&update, &[]).unwrap().into_plan().unwrap();
        assert!(plan.is_modify);
        assert_eq!(
            plan.parameter_types,
            vec![Some(DataType::BigInt), Some(DataType::Integer)]
        );
        assert!(plan.root.to_string().starts_with("Update(test.t, b = $2)\n  Filter("));

        let delete = Statement::Delete(DeleteStatement {
            table: t(),
            where_clause: None,
        });
        let plan = compiler.generate(&delete, &[]).unwrap().into_plan().unwrap();
        assert_eq!(plan.root.to_string(), "Delete(test.t)\n  TableScan(test.t)\n");

        let unknown = Statement::Update(UpdateStatement {
            table: t(),
            assignments: vec![Assignment {
                column: "zz".into(),
                value: Expr::literal(Value::Null),
            }],
            where_clause: None,
        });
        let err = compiler.generate(&unknown, &[]).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::UnknownColumn);
        assert_eq!(err.identifier(), Some("test.t.zz"));
    }

    #[test]
    fn test_ddl_not_applicable() {
        let catalog = catalog();
        let session = SessionContext::default();
        let compiler = OperatorCompiler::new(&catalog, &session);
        let stmt = Statement::DropTable { table: t() };
        assert!(matches!(
            compiler.generate(&stmt, &[]).unwrap(),
            Generated::NotApplicable
        ));
    }

    #[test]
    fn test_product_in_from_order() {
        let mut catalog = catalog();
        catalog
            .create_table(
                TableName::new("test", "u"),
                vec![Column::new("c", DataType::BigInt)],
            )
            .unwrap();
        let session = SessionContext::default();
        let compiler = OperatorCompiler::new(&catalog, &session);
        let stmt = Statement::Select(SelectStatement {
            columns: vec![SelectItem::Wildcard],
            from: vec![TableRef::new(ObjectName::new("u")), TableRef::new(t())],
            ..SelectStatement::default()
        });
        let plan = compiler.generate(&stmt, &[]).unwrap().into_plan().unwrap();
        assert_eq!(
            plan.root.to_string(),
            "Project(u.c, t.a, t.b, t.s)\n  Product()\n    TableScan(test.u)\n    TableScan(test.t)\n"
        );
    }

    #[test]
    fn test_parameter_index_limit() {
        let catalog = catalog();
        let session = SessionContext::default();
        let compiler = OperatorCompiler::new(&catalog, &session);
        let select = |index: usize| {
            Statement::Select(
                SelectStatement::star_from(t())
                    .with_where(Expr::eq(Expr::column("a"), Expr::param(index))),
            )
        };

        for index in [usize::MAX, 1 << 40, MAX_PARAMETERS] {
            let err = compiler.generate(&select(index), &[]).unwrap_err();
            assert_eq!(err.code(), PlannerErrorCode::InvalidStatement);
        }

        let plan = compiler
            .generate(&select(MAX_PARAMETERS - 1), &[])
            .unwrap()
            .into_plan()
            .unwrap();
        assert_eq!(plan.parameter_types.len(), MAX_PARAMETERS);
        assert_eq!(plan.parameter_types[MAX_PARAMETERS - 1], Some(DataType::BigInt));
    }
}
