//! Index range derivation
//!
//! Picks at most one index per table source and derives its key range from
//! the sargable WHERE conjuncts:
//!
//! - `column op constant` and `constant op column`, op in `= < <= > >=`
//! - `column BETWEEN c1 AND c2`
//! - row-value comparisons `(c1, .., ck) op (v1, .., vk)` and row BETWEEN,
//!   when the columns are exactly the index's leading fields
//!
//! A constant is a non-NULL literal or a parameter.
//!
//! Choice is rule-based. The index binding the most leading fields wins,
//! ties go to the one with more equality fields, then to the smallest index
//! name. The range never replaces the predicate: the caller keeps a Filter
//! over the scan.

use std::cmp::{Ordering, Reverse};
use std::sync::Arc;

use crate::catalog::{Index, IndexField, Table, Value};
use crate::collation;
use crate::sql::BinaryOp;

use super::binder::BoundExpr;
use super::errors::PlannerResult;
use super::range::{BoundValue, IndexBound, IndexKeyRange};

type Endpoint<T> = Option<(T, bool)>;

/// Scalar constraints on one table column
#[derive(Debug, Clone, Default)]
struct ColumnConstraints {
    eq: Option<BoundValue>,
    lower: Endpoint<BoundValue>,
    upper: Endpoint<BoundValue>,
}

/// Constraints on a row of columns, compared as one composite value
#[derive(Debug, Clone)]
struct RowConstraint {
    columns: Vec<usize>,
    lower: Endpoint<Vec<BoundValue>>,
    upper: Endpoint<Vec<BoundValue>>,
    equality: bool,
}

#[derive(Debug, Default)]
struct Sargs {
    columns: Vec<ColumnConstraints>,
    rows: Vec<RowConstraint>,
}

impl Sargs {
    fn collect(table: &Table, source: usize, conjuncts: &[&BoundExpr]) -> Self {
        let mut sargs = Sargs {
            columns: vec![ColumnConstraints::default(); table.columns.len()],
            rows: Vec::new(),
        };
        for conjunct in conjuncts {
            match conjunct {
                BoundExpr::Binary { op, left, right }
                    if op.is_comparison() && *op != BinaryOp::NotEq =>
                {
                    sargs.add_comparison(source, *op, left, right);
                }
                BoundExpr::Between {
                    expr,
                    low,
                    high,
                    negated: false,
                } => sargs.add_between(source, expr, low, high),
                _ => {}
            }
        }
        sargs
    }

    fn add_comparison(&mut self, source: usize, op: BinaryOp, left: &BoundExpr, right: &BoundExpr) {
        if let (Some(col), Some(value)) = (column_of(left, source), constant(right)) {
            self.add_scalar(col, op, value);
        } else if let (Some(col), Some(value)) = (column_of(right, source), constant(left)) {
            self.add_scalar(col, op.flip(), value);
        } else if let (Some(cols), Some(values)) = (columns_of(left, source), constants(right)) {
            self.add_row(cols, op, values);
        } else if let (Some(cols), Some(values)) = (columns_of(right, source), constants(left)) {
            self.add_row(cols, op.flip(), values);
        }
    }

    fn add_between(&mut self, source: usize, expr: &BoundExpr, low: &BoundExpr, high: &BoundExpr) {
        if let (Some(col), Some(lo), Some(hi)) = (column_of(expr, source), constant(low), constant(high)) {
            self.add_scalar(col, BinaryOp::GtEq, lo);
            self.add_scalar(col, BinaryOp::LtEq, hi);
        } else if let (Some(cols), Some(lo), Some(hi)) =
            (columns_of(expr, source), constants(low), constants(high))
        {
            self.add_row(cols.clone(), BinaryOp::GtEq, lo);
            self.add_row(cols, BinaryOp::LtEq, hi);
        }
    }

    /// Keeps the first constraint of each kind per column
    fn add_scalar(&mut self, col: usize, op: BinaryOp, value: BoundValue) {
        let Some(c) = self.columns.get_mut(col) else {
            return;
        };
        match op {
            BinaryOp::Eq => {
                c.eq.get_or_insert(value);
            }
            BinaryOp::Gt | BinaryOp::GtEq => {
                c.lower.get_or_insert((value, op == BinaryOp::GtEq));
            }
            BinaryOp::Lt | BinaryOp::LtEq => {
                c.upper.get_or_insert((value, op == BinaryOp::LtEq));
            }
            _ => {}
        }
    }

    fn add_row(&mut self, columns: Vec<usize>, op: BinaryOp, values: Vec<BoundValue>) {
        if columns.len() != values.len() {
            return;
        }
        let entry = match self.rows.iter_mut().position(|r| r.columns == columns) {
            Some(i) => &mut self.rows[i],
            None => {
                self.rows.push(RowConstraint {
                    columns,
                    lower: None,
                    upper: None,
                    equality: false,
                });
                let last = self.rows.len() - 1;
                &mut self.rows[last]
            }
        };
        match op {
            BinaryOp::Eq if entry.lower.is_none() && entry.upper.is_none() => {
                entry.lower = Some((values.clone(), true));
                entry.upper = Some((values, true));
                entry.equality = true;
            }
            BinaryOp::Gt | BinaryOp::GtEq => {
                entry.lower.get_or_insert((values, op == BinaryOp::GtEq));
            }
            BinaryOp::Lt | BinaryOp::LtEq => {
                entry.upper.get_or_insert((values, op == BinaryOp::LtEq));
            }
            _ => {}
        }
    }
}

fn column_of(expr: &BoundExpr, source: usize) -> Option<usize> {
    match expr {
        BoundExpr::Column(c) if c.source == source => Some(c.position),
        _ => None,
    }
}

fn constant(expr: &BoundExpr) -> Option<BoundValue> {
    match expr {
        BoundExpr::Literal(Value::Null) => None,
        BoundExpr::Literal(v) => Some(BoundValue::Literal(v.clone())),
        BoundExpr::Parameter(i) => Some(BoundValue::Parameter(*i)),
        _ => None,
    }
}

fn columns_of(expr: &BoundExpr, source: usize) -> Option<Vec<usize>> {
    match expr {
        BoundExpr::Row(items) => items.iter().map(|e| column_of(e, source)).collect(),
        _ => None,
    }
}

fn constants(expr: &BoundExpr) -> Option<Vec<BoundValue>> {
    match expr {
        BoundExpr::Row(items) => items.iter().map(constant).collect(),
        _ => None,
    }
}

struct Candidate {
    range: IndexKeyRange,
    equalities: usize,
}

impl Candidate {
    fn rank(&self) -> (usize, usize, Reverse<&str>) {
        (
            self.range.bound_columns(),
            self.equalities,
            Reverse(self.range.index().name.as_str()),
        )
    }
}

/// Best index range for the table source at `source`, if any index applies
pub fn choose_range(
    table: &Table,
    source: usize,
    conjuncts: &[&BoundExpr],
) -> PlannerResult<Option<IndexKeyRange>> {
    let sargs = Sargs::collect(table, source, conjuncts);
    let mut best: Option<Candidate> = None;
    for index in &table.indexes {
        let mut candidates = Vec::new();
        candidates.extend(scalar_candidate(index, &sargs)?);
        for row in &sargs.rows {
            candidates.extend(row_candidate(index, row)?);
        }
        for candidate in candidates {
            let better = match &best {
                None => true,
                Some(current) => candidate.rank() > current.rank(),
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    Ok(best.map(|c| c.range))
}

fn scalar_candidate(index: &Arc<Index>, sargs: &Sargs) -> PlannerResult<Option<Candidate>> {
    let mut prefix = Vec::new();
    for field in &index.fields {
        match &sargs.columns[field.column_position].eq {
            Some(value) => prefix.push(value.clone()),
            None => break,
        }
    }
    let equalities = prefix.len();
    let range_field = index
        .field(equalities)
        .map(|f| &sargs.columns[f.column_position]);
    let (lower, upper) = match range_field {
        Some(c) => (c.lower.clone(), c.upper.clone()),
        None => (None, None),
    };

    let extend = |value: BoundValue| {
        let mut values = prefix.clone();
        values.push(value);
        Some(IndexBound::leading(values))
    };
    let index = Arc::clone(index);
    let range = match (lower, upper) {
        (Some((lo, lo_inc)), Some((hi, hi_inc))) => {
            IndexKeyRange::bounded(index, extend(lo), lo_inc, extend(hi), hi_inc)?
        }
        (Some((lo, lo_inc)), None) => IndexKeyRange::starting_at(index, extend(lo), lo_inc)?,
        (None, Some((hi, hi_inc))) => IndexKeyRange::ending_at(index, extend(hi), hi_inc)?,
        (None, None) if equalities > 0 => {
            let bound = IndexBound::leading(prefix.clone());
            IndexKeyRange::bounded(index, Some(bound.clone()), true, Some(bound), true)?
        }
        (None, None) => return Ok(None),
    };
    Ok(Some(finish(range, equalities)))
}

fn row_candidate(index: &Arc<Index>, row: &RowConstraint) -> PlannerResult<Option<Candidate>> {
    let k = row.columns.len();
    let leading = k > 0
        && k <= index.degree()
        && index
            .fields
            .iter()
            .zip(&row.columns)
            .all(|(field, col)| field.column_position == *col);
    if !leading {
        return Ok(None);
    }

    let index = Arc::clone(index);
    let mut range = match (&row.lower, &row.upper) {
        (Some((lo, lo_inc)), Some((hi, hi_inc))) => IndexKeyRange::bounded(
            index,
            leading_bound(lo),
            *lo_inc,
            leading_bound(hi),
            *hi_inc,
        )?,
        (Some((lo, lo_inc)), None) => {
            IndexKeyRange::starting_at(index, leading_bound(lo), *lo_inc)?
        }
        (None, Some((hi, hi_inc))) => IndexKeyRange::ending_at(index, leading_bound(hi), *hi_inc)?,
        (None, None) => return Ok(None),
    };
    // A one-sided row comparison orders the whole composite value
    if range.lo().is_none() || range.hi().is_none() {
        range.set_lexicographic(k > 1);
        return Ok(Some(Candidate {
            range,
            equalities: 0,
        }));
    }
    let equalities = if row.equality { k } else { 0 };
    Ok(Some(finish(range, equalities)))
}

fn leading_bound(values: &[BoundValue]) -> Option<IndexBound> {
    Some(IndexBound::leading(values.to_vec()))
}

/// Sets the lexicographic flag on a two-sided range: a range is
/// lexicographic when some bound field before the last is not provably the
/// same in both bounds.
fn finish(mut range: IndexKeyRange, equalities: usize) -> Candidate {
    if let (Some(lo), Some(hi)) = (range.lo(), range.hi()) {
        let last = range.bound_columns().saturating_sub(1);
        let index = range.index();
        let lexicographic = (0..last).any(|position| {
            match (
                index.field(position),
                lo.values().get(position),
                hi.values().get(position),
            ) {
                (Some(field), Some(a), Some(b)) => !provably_equal(field, a, b),
                _ => true,
            }
        });
        range.set_lexicographic(lexicographic);
    }
    Candidate { range, equalities }
}

/// Parameters are only provably equal to themselves
fn provably_equal(field: &IndexField, a: &BoundValue, b: &BoundValue) -> bool {
    match (a, b) {
        (BoundValue::Parameter(x), BoundValue::Parameter(y)) => x == y,
        (BoundValue::Literal(x), BoundValue::Literal(y)) => literal_equal(field, x, y),
        _ => false,
    }
}

fn literal_equal(field: &IndexField, a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Text(_), Value::Text(_)) => matches!(
            collation::collator_for(field.collation).and_then(|c| c.compare_values(a, b)),
            Ok(Ordering::Equal)
        ),
        (Value::Int(i), Value::Double(d)) | (Value::Double(d), Value::Int(i)) => *i as f64 == *d,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogView, Column, DataType, TableName};
    use crate::collation::EN_US_CI_ID;
    use crate::planner::binder::BoundColumn;

    fn table() -> Arc<Table> {
        let mut catalog = Catalog::new();
        catalog.create_schema("test").unwrap();
        let name = TableName::new("test", "t");
        catalog
            .create_table(
                name.clone(),
                vec![
                    Column::new("a", DataType::BigInt),
                    Column::new("b", DataType::BigInt),
                    Column::new("c", DataType::BigInt),
                    Column::new("s", DataType::Varchar).with_collation(EN_US_CI_ID),
                ],
            )
            .unwrap();
        let cols = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        catalog.create_index(&name, "abc", &cols(&["a", "b", "c"]), false).unwrap();
        catalog.create_index(&name, "b_only", &cols(&["b"]), false).unwrap();
        catalog.create_index(&name, "s_a", &cols(&["s", "a"]), false).unwrap();
        catalog.table(&name).unwrap()
    }

    fn col(table: &Table, name: &str) -> BoundExpr {
        let (position, column) = table.column(name).unwrap();
        BoundExpr::Column(BoundColumn {
            source: 0,
            qualifier: "t".into(),
            position,
            name: column.name.clone(),
            data_type: Some(column.data_type),
            collation: column.collation,
        })
    }

    fn lit(v: impl Into<Value>) -> BoundExpr {
        BoundExpr::Literal(v.into())
    }

    fn cmp(op: BinaryOp, left: BoundExpr, right: BoundExpr) -> BoundExpr {
        BoundExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn between(expr: BoundExpr, low: BoundExpr, high: BoundExpr) -> BoundExpr {
        BoundExpr::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    fn choose(table: &Table, conjuncts: &[BoundExpr]) -> Option<IndexKeyRange> {
        let refs: Vec<&BoundExpr> = conjuncts.iter().collect();
        choose_range(table, 0, &refs).unwrap()
    }

    #[test]
    fn test_no_sargable_conjuncts() {
        let t = table();
        assert!(choose(&t, &[]).is_none());
        let not_eq = cmp(BinaryOp::NotEq, col(&t, "a"), lit(1));
        assert!(choose(&t, &[not_eq]).is_none());
        let null = cmp(BinaryOp::Eq, col(&t, "a"), BoundExpr::Literal(Value::Null));
        assert!(choose(&t, &[null]).is_none());
    }

    #[test]
    fn test_equality_prefix_and_range() {
        let t = table();
        let range = choose(
            &t,
            &[
                cmp(BinaryOp::Eq, col(&t, "a"), lit(1)),
                cmp(BinaryOp::Gt, lit(5), col(&t, "b")),
            ],
        )
        .unwrap();
        assert_eq!(range.index().name, "abc");
        assert_eq!(range.bound_columns(), 2);
        assert!(range.lo().is_none());
        assert!(!range.hi_inclusive());
        assert!(!range.lexicographic());
        assert_eq!(range.to_string(), "(, < (1, 5))");
    }

    #[test]
    fn test_most_bound_columns_wins() {
        let t = table();
        let range = choose(
            &t,
            &[
                cmp(BinaryOp::Eq, col(&t, "b"), lit(2)),
                cmp(BinaryOp::Eq, col(&t, "a"), lit(1)),
            ],
        )
        .unwrap();
        assert_eq!(range.index().name, "abc");
        assert_eq!(range.bound_columns(), 2);

        let range = choose(&t, &[cmp(BinaryOp::Eq, col(&t, "b"), lit(2))]).unwrap();
        assert_eq!(range.index().name, "b_only");
    }

    #[test]
    fn test_between_on_last_column_is_not_lexicographic() {
        let t = table();
        let range = choose(
            &t,
            &[
                cmp(BinaryOp::Eq, col(&t, "a"), lit(1)),
                cmp(BinaryOp::Eq, col(&t, "b"), lit(10)),
                between(col(&t, "c"), lit(800), lit(888)),
            ],
        )
        .unwrap();
        assert_eq!(range.bound_columns(), 3);
        assert!(!range.lexicographic());
    }

    fn row(items: Vec<BoundExpr>) -> BoundExpr {
        BoundExpr::Row(items)
    }

    #[test]
    fn test_row_between_sets_lexicographic() {
        let t = table();
        let cols = || row(vec![col(&t, "a"), col(&t, "b"), col(&t, "c")]);

        let same = choose(
            &t,
            &[between(
                cols(),
                row(vec![lit(1), lit(10), lit(800)]),
                row(vec![lit(1), lit(10), lit(888)]),
            )],
        )
        .unwrap();
        assert_eq!(same.bound_columns(), 3);
        assert!(!same.lexicographic());

        let differing = choose(
            &t,
            &[between(
                cols(),
                row(vec![lit(1), lit(10), lit(800)]),
                row(vec![lit(1), lit(20), lit(888)]),
            )],
        )
        .unwrap();
        assert_eq!(differing.bound_columns(), 3);
        assert!(differing.lexicographic());
    }

    #[test]
    fn test_one_sided_row_comparison() {
        let t = table();
        let range = choose(
            &t,
            &[cmp(
                BinaryOp::GtEq,
                row(vec![col(&t, "a"), col(&t, "b")]),
                row(vec![lit(1), BoundExpr::Parameter(0)]),
            )],
        )
        .unwrap();
        assert_eq!(range.bound_columns(), 2);
        assert!(range.hi().is_none());
        assert!(range.lexicographic());
    }

    #[test]
    fn test_collated_strings_compared_through_collation() {
        let t = table();
        let range = choose(
            &t,
            &[between(
                row(vec![col(&t, "s"), col(&t, "a")]),
                row(vec![lit("ABC"), lit(1)]),
                row(vec![lit("abc"), lit(9)]),
            )],
        )
        .unwrap();
        assert_eq!(range.index().name, "s_a");
        assert!(!range.lexicographic());
    }

    #[test]
    fn test_distinct_parameters_are_not_provably_equal() {
        let t = table();
        let range = choose(
            &t,
            &[between(
                row(vec![col(&t, "a"), col(&t, "b")]),
                row(vec![BoundExpr::Parameter(0), lit(1)]),
                row(vec![BoundExpr::Parameter(1), lit(2)]),
            )],
        )
        .unwrap();
        assert!(range.lexicographic());
    }
}
