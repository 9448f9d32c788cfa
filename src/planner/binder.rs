//! Name binding
//!
//! Resolves table, view and column references against a catalog snapshot
//! and the session's view registry. Identifiers match case-insensitively;
//! bound columns carry the declared spelling.
//!
//! A view reference is expanded like a macro: its defining query is bound
//! afresh at every reference, in its own scope.

use std::fmt;
use std::sync::Arc;

use crate::catalog::{CatalogView, DataType, Table, TableName, Value};
use crate::collation::CollationId;
use crate::observability::{log_event, Event, Severity};
use crate::session::{SessionContext, ViewDefinition};
use crate::sql::{BinaryOp, Expr, ObjectName, SelectItem, SelectStatement, TableRef};

use super::errors::{PlannerError, PlannerResult};
use super::typer::TypeResolver;

/// A column reference resolved to a source and position
#[derive(Debug, Clone, PartialEq)]
pub struct BoundColumn {
    /// Index of the source in its scope
    pub source: usize,
    /// Alias or name of the source, for display
    pub qualifier: String,
    /// Position within the source's columns
    pub position: usize,
    /// Declared column name
    pub name: String,
    pub data_type: Option<DataType>,
    pub collation: Option<CollationId>,
}

/// Expression with every name resolved
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    Column(BoundColumn),
    Literal(Value),
    Parameter(usize),
    Binary {
        op: BinaryOp,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
    },
    Not(Box<BoundExpr>),
    IsNull {
        expr: Box<BoundExpr>,
        negated: bool,
    },
    Between {
        expr: Box<BoundExpr>,
        low: Box<BoundExpr>,
        high: Box<BoundExpr>,
        negated: bool,
    },
    Row(Vec<BoundExpr>),
}

impl BoundExpr {
    /// Splits a predicate into its top-level AND terms
    pub fn conjuncts(&self) -> Vec<&BoundExpr> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                BoundExpr::Binary {
                    op: BinaryOp::And,
                    left,
                    right,
                } => {
                    stack.push(right);
                    stack.push(left);
                }
                other => out.push(other),
            }
        }
        out
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            BoundExpr::Binary { .. }
                | BoundExpr::Between { .. }
                | BoundExpr::IsNull { .. }
                | BoundExpr::Not(_)
        )
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &BoundExpr) -> fmt::Result {
    if expr.is_compound() {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundExpr::Column(c) => write!(f, "{}.{}", c.qualifier, c.name),
            BoundExpr::Literal(v) => write!(f, "{}", v),
            BoundExpr::Parameter(i) => write!(f, "${}", i + 1),
            BoundExpr::Binary { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right)
            }
            BoundExpr::Not(expr) => {
                f.write_str("NOT ")?;
                write_operand(f, expr)
            }
            BoundExpr::IsNull { expr, negated } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " IS NOT NULL" } else { " IS NULL" })
            }
            BoundExpr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " })?;
                write_operand(f, low)?;
                f.write_str(" AND ")?;
                write_operand(f, high)
            }
            BoundExpr::Row(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A column as exposed by a source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceColumn {
    pub name: String,
    pub data_type: Option<DataType>,
    pub collation: Option<CollationId>,
}

#[derive(Debug, Clone)]
pub enum SourceKind {
    Table(Arc<Table>),
    /// Expanded view body
    View { name: String, query: Box<BoundSelect> },
}

/// A FROM item with its exposed columns
#[derive(Debug, Clone)]
pub struct BoundSource {
    pub alias: String,
    pub kind: SourceKind,
    pub columns: Vec<SourceColumn>,
}

impl BoundSource {
    /// Source over a catalog table, aliased by its name unless `alias` is set
    pub fn table(table: Arc<Table>, alias: Option<&str>) -> Self {
        let columns = table
            .columns
            .iter()
            .map(|c| SourceColumn {
                name: c.name.clone(),
                data_type: Some(c.data_type),
                collation: c.collation,
            })
            .collect();
        Self {
            alias: alias.unwrap_or(&table.name.table).to_string(),
            kind: SourceKind::Table(table),
            columns,
        }
    }

    fn column_ref(&self, source: usize, position: usize) -> BoundColumn {
        let column = &self.columns[position];
        BoundColumn {
            source,
            qualifier: self.alias.clone(),
            position,
            name: column.name.clone(),
            data_type: column.data_type,
            collation: column.collation,
        }
    }

    fn find_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// One output column of a SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectItem {
    pub expr: BoundExpr,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub expr: BoundExpr,
    pub descending: bool,
}

/// A SELECT with every name resolved
#[derive(Debug, Clone)]
pub struct BoundSelect {
    pub sources: Vec<BoundSource>,
    pub projection: Vec<ProjectItem>,
    pub where_clause: Option<BoundExpr>,
    pub order_by: Vec<SortKey>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// Resolves names for one statement
pub struct Binder<'a, C: CatalogView + ?Sized> {
    catalog: &'a C,
    session: &'a SessionContext,
    /// Views currently being expanded, lowercased
    expanding: Vec<String>,
}

impl<'a, C: CatalogView + ?Sized> Binder<'a, C> {
    pub fn new(catalog: &'a C, session: &'a SessionContext) -> Self {
        Self {
            catalog,
            session,
            expanding: Vec::new(),
        }
    }

    /// Resolves a table name, defaulting the schema to the session's
    pub fn bind_table(&self, name: &ObjectName) -> PlannerResult<Arc<Table>> {
        let schema = name
            .schema
            .as_deref()
            .unwrap_or_else(|| self.session.default_schema());
        if !self.catalog.schema_exists(schema) {
            return Err(PlannerError::unknown_schema(schema));
        }
        let table_name = TableName::new(schema, &name.name);
        self.catalog
            .table(&table_name)
            .ok_or_else(|| PlannerError::unknown_table(table_name.to_string()))
    }

    pub fn bind_select(&mut self, select: &SelectStatement) -> PlannerResult<BoundSelect> {
        let mut sources: Vec<BoundSource> = Vec::with_capacity(select.from.len());
        for table_ref in &select.from {
            let source = self.bind_source(table_ref)?;
            if sources
                .iter()
                .any(|s| s.alias.eq_ignore_ascii_case(&source.alias))
            {
                return Err(PlannerError::invalid_statement(format!(
                    "Table name '{}' specified more than once",
                    source.alias
                )));
            }
            sources.push(source);
        }

        let mut projection = Vec::new();
        for item in &select.columns {
            match item {
                SelectItem::Wildcard => {
                    if sources.is_empty() {
                        return Err(PlannerError::invalid_statement(
                            "SELECT * requires a FROM clause",
                        ));
                    }
                    for (i, source) in sources.iter().enumerate() {
                        expand_source(&mut projection, i, source);
                    }
                }
                SelectItem::QualifiedWildcard { table } => {
                    let (i, source) = sources
                        .iter()
                        .enumerate()
                        .find(|(_, s)| s.alias.eq_ignore_ascii_case(table))
                        .ok_or_else(|| PlannerError::unknown_table(table.clone()))?;
                    expand_source(&mut projection, i, source);
                }
                SelectItem::Expr {
                    expr,
                    alias,
                    default_name,
                } => {
                    let bound = self.bind_expr(expr, &sources)?;
                    let name = match (alias, &bound) {
                        (Some(alias), _) => alias.clone(),
                        (None, BoundExpr::Column(c)) => c.name.clone(),
                        (None, _) => default_name.clone().unwrap_or_else(|| expr.to_string()),
                    };
                    projection.push(ProjectItem { expr: bound, name });
                }
            }
        }

        let where_clause = select
            .where_clause
            .as_ref()
            .map(|w| self.bind_expr(w, &sources))
            .transpose()?;
        let order_by = select
            .order_by
            .iter()
            .map(|item| {
                Ok(SortKey {
                    expr: self.bind_expr(&item.expr, &sources)?,
                    descending: item.descending,
                })
            })
            .collect::<PlannerResult<Vec<_>>>()?;

        Ok(BoundSelect {
            sources,
            projection,
            where_clause,
            order_by,
            offset: select.offset,
            limit: select.limit,
        })
    }

    fn bind_source(&mut self, table_ref: &TableRef) -> PlannerResult<BoundSource> {
        if table_ref.name.schema.is_none() {
            if let Some(view) = self.session.views().get(&table_ref.name.name) {
                let view = Arc::clone(view);
                return self.expand_view(&view, table_ref.alias.as_deref());
            }
        }
        let table = self.bind_table(&table_ref.name)?;
        Ok(BoundSource::table(table, table_ref.alias.as_deref()))
    }

    fn expand_view(
        &mut self,
        view: &ViewDefinition,
        alias: Option<&str>,
    ) -> PlannerResult<BoundSource> {
        let key = view.name().to_lowercase();
        if self.expanding.contains(&key) {
            return Err(PlannerError::recursive_view(view.name()));
        }
        self.expanding.push(key);
        let query = self.bind_select(view.query());
        self.expanding.pop();
        let query = query?;

        if !view.columns().is_empty() && view.columns().len() != query.projection.len() {
            return Err(PlannerError::invalid_statement(format!(
                "View '{}' declares {} columns but its query returns {}",
                view.name(),
                view.columns().len(),
                query.projection.len()
            )));
        }

        // View bodies carry no parameters
        let mut typer = TypeResolver::new(0, &[]);
        let mut columns = Vec::with_capacity(query.projection.len());
        for (i, item) in query.projection.iter().enumerate() {
            let collation = match &item.expr {
                BoundExpr::Column(c) => c.collation,
                _ => None,
            };
            columns.push(SourceColumn {
                name: view
                    .columns()
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| item.name.clone()),
                data_type: typer.resolve(&item.expr)?,
                collation,
            });
        }

        let alias = alias.unwrap_or(view.name()).to_string();
        log_event(
            Severity::Trace,
            Event::ViewExpanded,
            &[("alias", &alias), ("view", view.name())],
        );
        Ok(BoundSource {
            alias,
            kind: SourceKind::View {
                name: view.name().to_string(),
                query: Box::new(query),
            },
            columns,
        })
    }

    /// Binds an expression against the given scope
    pub fn bind_expr(&self, expr: &Expr, scope: &[BoundSource]) -> PlannerResult<BoundExpr> {
        Ok(match expr {
            Expr::Column { table, name } => {
                BoundExpr::Column(resolve_column(scope, table.as_deref(), name)?)
            }
            Expr::Literal { value } => BoundExpr::Literal(value.clone()),
            Expr::Parameter { index } => BoundExpr::Parameter(*index),
            Expr::Binary { op, left, right } => BoundExpr::Binary {
                op: *op,
                left: Box::new(self.bind_expr(left, scope)?),
                right: Box::new(self.bind_expr(right, scope)?),
            },
            Expr::Not { expr } => BoundExpr::Not(Box::new(self.bind_expr(expr, scope)?)),
            Expr::IsNull { expr, negated } => BoundExpr::IsNull {
                expr: Box::new(self.bind_expr(expr, scope)?),
                negated: *negated,
            },
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => BoundExpr::Between {
                expr: Box::new(self.bind_expr(expr, scope)?),
                low: Box::new(self.bind_expr(low, scope)?),
                high: Box::new(self.bind_expr(high, scope)?),
                negated: *negated,
            },
            Expr::Row { items } => BoundExpr::Row(
                items
                    .iter()
                    .map(|item| self.bind_expr(item, scope))
                    .collect::<PlannerResult<_>>()?,
            ),
        })
    }
}

fn expand_source(projection: &mut Vec<ProjectItem>, index: usize, source: &BoundSource) {
    for position in 0..source.columns.len() {
        let column = source.column_ref(index, position);
        projection.push(ProjectItem {
            name: column.name.clone(),
            expr: BoundExpr::Column(column),
        });
    }
}

fn resolve_column(
    scope: &[BoundSource],
    qualifier: Option<&str>,
    name: &str,
) -> PlannerResult<BoundColumn> {
    if let Some(qualifier) = qualifier {
        let (index, source) = scope
            .iter()
            .enumerate()
            .find(|(_, s)| s.alias.eq_ignore_ascii_case(qualifier))
            .ok_or_else(|| PlannerError::unknown_table(qualifier))?;
        let position = source
            .find_column(name)
            .ok_or_else(|| PlannerError::unknown_column(format!("{}.{}", qualifier, name)))?;
        return Ok(source.column_ref(index, position));
    }

    let mut found = None;
    for (index, source) in scope.iter().enumerate() {
        if let Some(position) = source.find_column(name) {
            if found.is_some() {
                return Err(PlannerError::ambiguous_column(name));
            }
            found = Some(source.column_ref(index, position));
        }
    }
    found.ok_or_else(|| PlannerError::unknown_column(name))
}
