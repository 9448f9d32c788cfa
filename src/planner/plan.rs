//! Compiled plans and their operator trees

use std::fmt;

use serde::Serialize;

use crate::catalog::{DataType, TableName};

use super::binder::{BoundExpr, ProjectItem, SortKey};
use super::range::IndexKeyRange;

/// A table column targeted by INSERT or UPDATE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetColumn {
    pub position: usize,
    pub name: String,
}

/// Physical operator tree handed to the execution engine
#[derive(Debug, Clone)]
pub enum Operator {
    TableScan {
        table: TableName,
    },
    IndexScan {
        range: IndexKeyRange,
    },
    /// Literal rows; a single empty row for a SELECT without FROM
    Values {
        rows: Vec<Vec<BoundExpr>>,
    },
    Filter {
        input: Box<Operator>,
        predicate: BoundExpr,
    },
    /// Cartesian product in FROM order
    Product {
        inputs: Vec<Operator>,
    },
    Project {
        input: Box<Operator>,
        columns: Vec<ProjectItem>,
    },
    Sort {
        input: Box<Operator>,
        keys: Vec<SortKey>,
    },
    Insert {
        table: TableName,
        columns: Vec<TargetColumn>,
        input: Box<Operator>,
    },
    Update {
        table: TableName,
        assignments: Vec<(TargetColumn, BoundExpr)>,
        input: Box<Operator>,
    },
    Delete {
        table: TableName,
        input: Box<Operator>,
    },
}

impl Operator {
    /// True for operators that modify table rows
    pub fn is_update_capable(&self) -> bool {
        matches!(
            self,
            Operator::Insert { .. } | Operator::Update { .. } | Operator::Delete { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::TableScan { .. } => "TableScan",
            Operator::IndexScan { .. } => "IndexScan",
            Operator::Values { .. } => "Values",
            Operator::Filter { .. } => "Filter",
            Operator::Product { .. } => "Product",
            Operator::Project { .. } => "Project",
            Operator::Sort { .. } => "Sort",
            Operator::Insert { .. } => "Insert",
            Operator::Update { .. } => "Update",
            Operator::Delete { .. } => "Delete",
        }
    }

    pub fn inputs(&self) -> Vec<&Operator> {
        match self {
            Operator::TableScan { .. } | Operator::IndexScan { .. } | Operator::Values { .. } => {
                Vec::new()
            }
            Operator::Product { inputs } => inputs.iter().collect(),
            Operator::Filter { input, .. }
            | Operator::Project { input, .. }
            | Operator::Sort { input, .. }
            | Operator::Insert { input, .. }
            | Operator::Update { input, .. }
            | Operator::Delete { input, .. } => vec![input.as_ref()],
        }
    }

    fn write_detail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::TableScan { table } => write!(f, "{}", table),
            Operator::IndexScan { range } => {
                write!(f, "{}, {}", range.index(), range)?;
                if range.lexicographic() {
                    f.write_str(", lexicographic")?;
                }
                Ok(())
            }
            Operator::Values { rows } => {
                let rows: Vec<String> = rows
                    .iter()
                    .map(|row| join(row.iter().map(|e| e.to_string())))
                    .map(|row| format!("[{}]", row))
                    .collect();
                f.write_str(&rows.join(", "))
            }
            Operator::Filter { predicate, .. } => write!(f, "{}", predicate),
            Operator::Product { .. } => Ok(()),
            Operator::Project { columns, .. } => f.write_str(&join(columns.iter().map(|c| {
                match &c.expr {
                    BoundExpr::Column(col) if col.name == c.name => c.expr.to_string(),
                    expr => format!("{} AS {}", expr, c.name),
                }
            }))),
            Operator::Sort { keys, .. } => f.write_str(&join(keys.iter().map(|k| {
                format!("{} {}", k.expr, if k.descending { "DESC" } else { "ASC" })
            }))),
            Operator::Insert { table, columns, .. } => write!(
                f,
                "{}({})",
                table,
                join(columns.iter().map(|c| c.name.clone()))
            ),
            Operator::Update {
                table, assignments, ..
            } => write!(
                f,
                "{}, {}",
                table,
                join(assignments.iter().map(|(c, e)| format!("{} = {}", c.name, e)))
            ),
            Operator::Delete { table, .. } => write!(f, "{}", table),
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}(", "", self.name(), indent = depth * 2)?;
        self.write_detail(f)?;
        writeln!(f, ")")?;
        for input in self.inputs() {
            input.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

/// Indented tree, one operator per line
impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// Name and type of one query output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: Option<DataType>,
}

/// Immutable result of compiling one statement
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    pub statement_text: String,
    /// Root is update-capable; no result columns
    pub is_modify: bool,
    pub root: Operator,
    /// Query plans only
    pub result_columns: Vec<ResultColumn>,
    /// One slot per placeholder, `None` when unresolved
    pub parameter_types: Vec<Option<DataType>>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl CompiledPlan {
    pub fn kind(&self) -> &'static str {
        if self.is_modify {
            "modify"
        } else {
            "query"
        }
    }
}

/// Outcome of [`super::OperatorCompiler::generate`]
#[derive(Debug, Clone)]
pub enum Generated {
    Plan(CompiledPlan),
    /// The statement is schema-modifying and handled by DDL dispatch
    NotApplicable,
}

impl Generated {
    pub fn plan(&self) -> Option<&CompiledPlan> {
        match self {
            Generated::Plan(plan) => Some(plan),
            Generated::NotApplicable => None,
        }
    }

    pub fn into_plan(self) -> Option<CompiledPlan> {
        match self {
            Generated::Plan(plan) => Some(plan),
            Generated::NotApplicable => None,
        }
    }
}
