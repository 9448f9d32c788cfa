//! Statement, expression and clause structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{DataType, Value};

/// Possibly schema-qualified object name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectName {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
}

impl ObjectName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide
        )
    }

    /// The operator with its operands swapped: `a < b` is `b > a`.
    /// Non-comparisons are returned unchanged.
    pub fn flip(self) -> BinaryOp {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::LtEq => BinaryOp::GtEq,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::GtEq => BinaryOp::LtEq,
            other => other,
        }
    }
}

/// Scalar expression as produced by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Column {
        #[serde(default)]
        table: Option<String>,
        name: String,
    },
    Literal {
        value: Value,
    },
    /// Positional placeholder, zero-based
    Parameter {
        index: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not {
        expr: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        #[serde(default)]
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        #[serde(default)]
        negated: bool,
    },
    /// Row value constructor, `(a, b, c)`
    Row {
        items: Vec<Expr>,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal {
            value: value.into(),
        }
    }

    pub fn param(index: usize) -> Self {
        Expr::Parameter { index }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Eq, left, right)
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::And, left, right)
    }

    pub fn between(expr: Expr, low: Expr, high: Expr) -> Self {
        Expr::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    pub fn row(items: Vec<Expr>) -> Self {
        Expr::Row { items }
    }

    /// Visits this expression and every subexpression, parents first
    pub fn walk<F: FnMut(&Expr)>(&self, f: &mut F) {
        f(self);
        match self {
            Expr::Column { .. } | Expr::Literal { .. } | Expr::Parameter { .. } => {}
            Expr::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            Expr::Not { expr } | Expr::IsNull { expr, .. } => expr.walk(f),
            Expr::Between {
                expr, low, high, ..
            } => {
                expr.walk(f);
                low.walk(f);
                high.walk(f);
            }
            Expr::Row { items } => items.iter().for_each(|item| item.walk(f)),
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::Binary { .. } | Expr::Between { .. } | Expr::IsNull { .. } | Expr::Not { .. }
        )
    }
}

/// Writes an operand, parenthesized when it is itself an operator
fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    if expr.is_compound() {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column { table: Some(t), name } => write!(f, "{}.{}", t, name),
            Expr::Column { table: None, name } => f.write_str(name),
            Expr::Literal { value } => write!(f, "{}", value),
            Expr::Parameter { index } => write!(f, "${}", index + 1),
            Expr::Binary { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right)
            }
            Expr::Not { expr } => {
                f.write_str("NOT ")?;
                write_operand(f, expr)
            }
            Expr::IsNull { expr, negated } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " IS NOT NULL" } else { " IS NULL" })
            }
            Expr::Between {
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
            Expr::Row { items } => {
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

/// An entry of the SELECT list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectItem {
    /// `*`
    Wildcard,
    /// `t.*`
    QualifiedWildcard { table: String },
    Expr {
        expr: Expr,
        #[serde(default)]
        alias: Option<String>,
        /// Name the parser assigned to an unaliased expression
        #[serde(default)]
        default_name: Option<String>,
    },
}

impl SelectItem {
    pub fn expr(expr: Expr) -> Self {
        SelectItem::Expr {
            expr,
            alias: None,
            default_name: None,
        }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        SelectItem::Expr {
            expr,
            alias: Some(alias.into()),
            default_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub name: ObjectName,
    #[serde(default)]
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: ObjectName) -> Self {
        Self { name, alias: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expr: Expr,
    #[serde(default)]
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectStatement {
    pub columns: Vec<SelectItem>,
    #[serde(default)]
    pub from: Vec<TableRef>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<Expr>,
    #[serde(default)]
    pub order_by: Vec<OrderByItem>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl SelectStatement {
    /// `SELECT * FROM <table>`
    pub fn star_from(table: ObjectName) -> Self {
        Self {
            columns: vec![SelectItem::Wildcard],
            from: vec![TableRef::new(table)],
            ..Self::default()
        }
    }

    pub fn with_where(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    fn visit_exprs<F: FnMut(&Expr)>(&self, f: &mut F) {
        for item in &self.columns {
            if let SelectItem::Expr { expr, .. } = item {
                expr.walk(f);
            }
        }
        if let Some(predicate) = &self.where_clause {
            predicate.walk(f);
        }
        for item in &self.order_by {
            item.expr.walk(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsertSource {
    Values { rows: Vec<Vec<Expr>> },
    Select { query: SelectStatement },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    pub table: ObjectName,
    /// Target columns; empty means all columns in declared order
    #[serde(default)]
    pub columns: Vec<String>,
    pub source: InsertSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub table: ObjectName,
    pub assignments: Vec<Assignment>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub table: ObjectName,
    #[serde(default, rename = "where")]
    pub where_clause: Option<Expr>,
}

/// Column declaration in CREATE TABLE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub collation: Option<String>,
}

fn default_nullable() -> bool {
    true
}

/// How the compiler treats a statement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementCategory {
    /// Compiled into an operator plan
    Dml,
    /// Applied by the DDL dispatcher
    Ddl,
    /// Recognized, but no implementation exists
    Unsupported,
}

/// A parsed statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateSchema {
        name: String,
    },
    DropSchema {
        name: String,
    },
    CreateTable {
        table: ObjectName,
        columns: Vec<ColumnDef>,
    },
    DropTable {
        table: ObjectName,
    },
    CreateIndex {
        name: String,
        table: ObjectName,
        columns: Vec<String>,
        #[serde(default)]
        unique: bool,
    },
    DropIndex {
        name: String,
        table: ObjectName,
    },
    CreateView {
        name: String,
        #[serde(default)]
        columns: Vec<String>,
        query: SelectStatement,
    },
    DropView {
        name: String,
    },
    AlterTable {
        table: ObjectName,
    },
    Rename {
        from: ObjectName,
        to: ObjectName,
    },
    Revoke {
        object: ObjectName,
        grantee: String,
    },
}

impl Statement {
    pub fn category(&self) -> StatementCategory {
        match self {
            Statement::Select(_)
            | Statement::Insert(_)
            | Statement::Update(_)
            | Statement::Delete(_) => StatementCategory::Dml,
            Statement::CreateSchema { .. }
            | Statement::DropSchema { .. }
            | Statement::CreateTable { .. }
            | Statement::DropTable { .. }
            | Statement::CreateIndex { .. }
            | Statement::DropIndex { .. }
            | Statement::CreateView { .. }
            | Statement::DropView { .. } => StatementCategory::Ddl,
            Statement::AlterTable { .. } | Statement::Rename { .. } | Statement::Revoke { .. } => {
                StatementCategory::Unsupported
            }
        }
    }

    /// Short statement text used in plans and error messages
    pub fn statement_text(&self) -> String {
        match self {
            Statement::Select(_) => "SELECT".to_string(),
            Statement::Insert(s) => format!("INSERT INTO {}", s.table),
            Statement::Update(s) => format!("UPDATE {}", s.table),
            Statement::Delete(s) => format!("DELETE FROM {}", s.table),
            Statement::CreateSchema { name } => format!("CREATE SCHEMA {}", name),
            Statement::DropSchema { name } => format!("DROP SCHEMA {}", name),
            Statement::CreateTable { table, .. } => format!("CREATE TABLE {}", table),
            Statement::DropTable { table } => format!("DROP TABLE {}", table),
            Statement::CreateIndex { name, table, .. } => {
                format!("CREATE INDEX {} ON {}", name, table)
            }
            Statement::DropIndex { name, table } => format!("DROP INDEX {} ON {}", name, table),
            Statement::CreateView { name, .. } => format!("CREATE VIEW {}", name),
            Statement::DropView { name } => format!("DROP VIEW {}", name),
            Statement::AlterTable { table } => format!("ALTER TABLE {}", table),
            Statement::Rename { from, to } => format!("RENAME {} TO {}", from, to),
            Statement::Revoke { object, grantee } => {
                format!("REVOKE ON {} FROM {}", object, grantee)
            }
        }
    }

    /// Number of positional parameters: one past the highest index used,
    /// saturating at `usize::MAX`
    pub fn parameter_count(&self) -> usize {
        let mut count = 0;
        let mut track = |expr: &Expr| {
            if let Expr::Parameter { index } = expr {
                count = count.max(index.saturating_add(1));
            }
        };
        match self {
            Statement::Select(s) => s.visit_exprs(&mut track),
            Statement::Insert(s) => match &s.source {
                InsertSource::Values { rows } => {
                    rows.iter().flatten().for_each(|e| e.walk(&mut track))
                }
                InsertSource::Select { query } => query.visit_exprs(&mut track),
            },
            Statement::Update(s) => {
                s.assignments.iter().for_each(|a| a.value.walk(&mut track));
                if let Some(predicate) = &s.where_clause {
                    predicate.walk(&mut track);
                }
            }
            Statement::Delete(s) => {
                if let Some(predicate) = &s.where_clause {
                    predicate.walk(&mut track);
                }
            }
            Statement::CreateView { query, .. } => query.visit_exprs(&mut track),
            _ => {}
        }
        count
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.statement_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_select() {
        let json = r#"{"kind": "select",
            "columns": [{"kind": "expr", "expr": {"kind": "column", "name": "a"}, "alias": "x"}],
            "from": [{"name": {"schema": "test", "name": "t"}}],
            "where": {"kind": "binary", "op": "gt_eq",
                      "left": {"kind": "column", "name": "b"},
                      "right": {"kind": "parameter", "index": 1}},
            "limit": 10}"#;
        let stmt: Statement = serde_json::from_str(json).unwrap();
        let Statement::Select(select) = &stmt else {
            panic!("expected select");
        };
        assert_eq!(select.from[0].name, ObjectName::qualified("test", "t"));
        assert_eq!(select.limit, Some(10));
        assert_eq!(select.where_clause.as_ref().unwrap().to_string(), "b >= $2");
        assert_eq!(stmt.parameter_count(), 2);
        assert_eq!(stmt.category(), StatementCategory::Dml);
    }

    #[test]
    fn test_parameter_count_saturates() {
        let stmt = Statement::Select(
            SelectStatement::star_from(ObjectName::new("t"))
                .with_where(Expr::eq(Expr::column("a"), Expr::param(usize::MAX))),
        );
        assert_eq!(stmt.parameter_count(), usize::MAX);
    }

    #[test]
    fn test_literal_values_deserialize_untagged() {
        let json = r#"{"kind": "row", "items": [
            {"kind": "literal", "value": 1},
            {"kind": "literal", "value": "x"},
            {"kind": "literal", "value": null}]}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(
            expr,
            Expr::row(vec![
                Expr::literal(1),
                Expr::literal("x"),
                Expr::Literal { value: Value::Null }
            ])
        );
        assert_eq!(expr.to_string(), "(1, 'x', NULL)");
    }

    #[test]
    fn test_categories() {
        let alter = Statement::AlterTable {
            table: ObjectName::new("t"),
        };
        assert_eq!(alter.category(), StatementCategory::Unsupported);
        assert_eq!(alter.statement_text(), "ALTER TABLE t");

        let create = Statement::CreateSchema { name: "s".into() };
        assert_eq!(create.category(), StatementCategory::Ddl);
        assert_eq!(create.parameter_count(), 0);
    }

    #[test]
    fn test_display_parenthesizes_nested_operators() {
        let expr = Expr::and(
            Expr::eq(Expr::column("a"), Expr::literal(1)),
            Expr::between(Expr::qualified("t", "b"), Expr::param(0), Expr::literal(5)),
        );
        assert_eq!(expr.to_string(), "(a = 1) AND (t.b BETWEEN $1 AND 5)");
    }

    #[test]
    fn test_flip() {
        assert_eq!(BinaryOp::Lt.flip(), BinaryOp::Gt);
        assert_eq!(BinaryOp::GtEq.flip(), BinaryOp::LtEq);
        assert_eq!(BinaryOp::Eq.flip(), BinaryOp::Eq);
    }
}
