//! Index key ranges
//!
//! An [`IndexKeyRange`] bounds the traversal of one composite index. Each
//! bound is a partial key plus a [`ColumnSelector`] naming the declared
//! fields it constrains. Construction validates the shape:
//!
//! - the selected fields form a contiguous prefix starting at field 0
//! - when both bounds are given they select exactly the same fields
//! - a bound carries one value per selected field
//!
//! With `lexicographic == false` a range means an exact match on every bound
//! field but the last and a range on the last. With `lexicographic == true`
//! it is one interval over the whole composite key, so `(1, 10, 800)` to
//! `(1, 20, 888)` also admits `(1, 15, 0)`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{Index, Value};

use super::errors::{PlannerError, PlannerResult};

/// Names the declared index fields a bound constrains
pub trait ColumnSelector: fmt::Debug + Send + Sync {
    fn includes_column(&self, position: usize) -> bool;
}

/// Explicit set of field positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    positions: BTreeSet<usize>,
}

impl FieldSelector {
    pub fn new(positions: impl IntoIterator<Item = usize>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
        }
    }
}

impl ColumnSelector for FieldSelector {
    fn includes_column(&self, position: usize) -> bool {
        self.positions.contains(&position)
    }
}

/// Fields `0..k`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadingFields(pub usize);

impl ColumnSelector for LeadingFields {
    fn includes_column(&self, position: usize) -> bool {
        position < self.0
    }
}

/// One value of a partial key
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Literal(Value),
    /// Zero-based placeholder index, supplied at execution
    Parameter(usize),
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Literal(v) => write!(f, "{}", v),
            BoundValue::Parameter(i) => write!(f, "${}", i + 1),
        }
    }
}

/// Partial key: values for the selected fields, in field order
#[derive(Debug, Clone)]
pub struct IndexBound {
    values: Vec<BoundValue>,
    selector: Arc<dyn ColumnSelector>,
}

impl IndexBound {
    pub fn new(values: Vec<BoundValue>, selector: Arc<dyn ColumnSelector>) -> Self {
        Self { values, selector }
    }

    /// Bound over the first `values.len()` fields
    pub fn leading(values: Vec<BoundValue>) -> Self {
        let selector = Arc::new(LeadingFields(values.len()));
        Self { values, selector }
    }

    pub fn values(&self) -> &[BoundValue] {
        &self.values
    }

    pub fn selector(&self) -> &dyn ColumnSelector {
        self.selector.as_ref()
    }

    pub fn includes_column(&self, position: usize) -> bool {
        self.selector.includes_column(position)
    }
}

impl fmt::Display for IndexBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str(")")
    }
}

/// Validated key range over one index
#[derive(Debug, Clone)]
pub struct IndexKeyRange {
    index: Arc<Index>,
    lo: Option<IndexBound>,
    lo_inclusive: bool,
    hi: Option<IndexBound>,
    hi_inclusive: bool,
    bound_columns: usize,
    lexicographic: bool,
}

impl IndexKeyRange {
    /// Full index scan
    pub fn unbounded(index: Arc<Index>) -> Self {
        Self {
            index,
            lo: None,
            lo_inclusive: false,
            hi: None,
            hi_inclusive: false,
            bound_columns: 0,
            lexicographic: false,
        }
    }

    /// Range with only a lower bound
    pub fn starting_at(
        index: Arc<Index>,
        lo: Option<IndexBound>,
        lo_inclusive: bool,
    ) -> PlannerResult<Self> {
        let lo = lo.ok_or_else(|| PlannerError::invalid_argument("IndexBound lo must be specified"))?;
        let bound_columns = bound_columns(&index, Some(&lo), None)?;
        Ok(Self {
            index,
            lo: Some(lo),
            lo_inclusive,
            hi: None,
            hi_inclusive: false,
            bound_columns,
            lexicographic: false,
        })
    }

    /// Range with only an upper bound
    pub fn ending_at(
        index: Arc<Index>,
        hi: Option<IndexBound>,
        hi_inclusive: bool,
    ) -> PlannerResult<Self> {
        let hi = hi.ok_or_else(|| PlannerError::invalid_argument("IndexBound hi must be specified"))?;
        let bound_columns = bound_columns(&index, None, Some(&hi))?;
        Ok(Self {
            index,
            lo: None,
            lo_inclusive: false,
            hi: Some(hi),
            hi_inclusive,
            bound_columns,
            lexicographic: false,
        })
    }

    /// Range with both bounds, which must select the same fields
    pub fn bounded(
        index: Arc<Index>,
        lo: Option<IndexBound>,
        lo_inclusive: bool,
        hi: Option<IndexBound>,
        hi_inclusive: bool,
    ) -> PlannerResult<Self> {
        let (lo, hi) = match (lo, hi) {
            (Some(lo), Some(hi)) => (lo, hi),
            (None, _) => return Err(PlannerError::invalid_argument("IndexBound lo must be specified")),
            (_, None) => return Err(PlannerError::invalid_argument("IndexBound hi must be specified")),
        };
        let bound_columns = bound_columns(&index, Some(&lo), Some(&hi))?;
        Ok(Self {
            index,
            lo: Some(lo),
            lo_inclusive,
            hi: Some(hi),
            hi_inclusive,
            bound_columns,
            lexicographic: false,
        })
    }

    pub fn index(&self) -> &Arc<Index> {
        &self.index
    }

    pub fn lo(&self) -> Option<&IndexBound> {
        self.lo.as_ref()
    }

    pub fn hi(&self) -> Option<&IndexBound> {
        self.hi.as_ref()
    }

    /// Meaningful only when `lo` is present
    pub fn lo_inclusive(&self) -> bool {
        self.lo_inclusive
    }

    /// Meaningful only when `hi` is present
    pub fn hi_inclusive(&self) -> bool {
        self.hi_inclusive
    }

    /// Length of the bound leading prefix; 0 for a full scan
    pub fn bound_columns(&self) -> usize {
        self.bound_columns
    }

    pub fn is_unbounded(&self) -> bool {
        self.lo.is_none() && self.hi.is_none()
    }

    pub fn lexicographic(&self) -> bool {
        self.lexicographic
    }

    pub fn set_lexicographic(&mut self, lexicographic: bool) {
        self.lexicographic = lexicographic;
    }
}

impl fmt::Display for IndexKeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        if let Some(lo) = &self.lo {
            write!(f, "{} {}", if self.lo_inclusive { ">=" } else { ">" }, lo)?;
        }
        f.write_str(", ")?;
        if let Some(hi) = &self.hi {
            write!(f, "{} {}", if self.hi_inclusive { "<=" } else { "<" }, hi)?;
        }
        f.write_str(")")
    }
}

/// Counts the bound leading fields, rejecting gaps and mismatched selectors.
///
/// At each position the mismatch check runs before the leading check.
fn bound_columns(
    index: &Index,
    lo: Option<&IndexBound>,
    hi: Option<&IndexBound>,
) -> PlannerResult<usize> {
    let mut still_leading = true;
    let mut count = 0;
    for position in 0..index.degree() {
        let in_lo = lo.map(|b| b.includes_column(position));
        let in_hi = hi.map(|b| b.includes_column(position));
        let included = match (in_lo, in_hi) {
            (Some(a), Some(b)) if a != b => {
                return Err(PlannerError::mismatched_bounds(&index.name, position));
            }
            (Some(a), _) => a,
            (None, Some(b)) => b,
            (None, None) => false,
        };
        if still_leading {
            if included {
                count += 1;
            } else {
                still_leading = false;
            }
        } else if included {
            return Err(PlannerError::non_leading_field(&index.name, position));
        }
    }
    debug_assert!(
        count > 0 || (lo.is_none() && hi.is_none()),
        "bound on index {} selects no fields",
        index.name
    );
    for (side, bound) in [("lo", lo), ("hi", hi)] {
        if let Some(bound) = bound {
            if bound.values().len() != count {
                return Err(PlannerError::invalid_argument(format!(
                    "IndexBound {} has {} values for {} bound fields of index {}",
                    side,
                    bound.values().len(),
                    count,
                    index.name
                )));
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DataType, IndexField, TableName};
    use crate::planner::errors::PlannerErrorCode;

    fn index(degree: usize) -> Arc<Index> {
        Arc::new(Index {
            name: "idx".into(),
            table: TableName::new("test", "t"),
            unique: false,
            fields: (0..degree)
                .map(|i| IndexField {
                    position: i,
                    column: format!("c{}", i),
                    column_position: i,
                    data_type: DataType::BigInt,
                    collation: None,
                })
                .collect(),
        })
    }

    fn ints(values: &[i64]) -> Vec<BoundValue> {
        values.iter().map(|v| BoundValue::Literal(Value::Int(*v))).collect()
    }

    fn select(values: &[i64], positions: &[usize]) -> Option<IndexBound> {
        Some(IndexBound::new(
            ints(values),
            Arc::new(FieldSelector::new(positions.iter().copied())),
        ))
    }

    #[test]
    fn test_unbounded() {
        let range = IndexKeyRange::unbounded(index(3));
        assert!(range.is_unbounded());
        assert_eq!(range.bound_columns(), 0);
        assert_eq!(range.to_string(), "(, )");
    }

    #[test]
    fn test_leading_prefixes() {
        for k in 1..=3 {
            let values: Vec<i64> = (0..k as i64).collect();
            let lo = Some(IndexBound::leading(ints(&values)));
            let range = IndexKeyRange::starting_at(index(3), lo, true).unwrap();
            assert_eq!(range.bound_columns(), k);
            assert!(!range.is_unbounded());
        }
    }

    #[test]
    fn test_missing_bounds() {
        let err = IndexKeyRange::starting_at(index(2), None, true).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidArgument);
        let err = IndexKeyRange::ending_at(index(2), None, true).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidArgument);
        let err = IndexKeyRange::bounded(index(2), select(&[1], &[0]), true, None, true)
            .unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidArgument);
    }

    #[test]
    fn test_non_leading_field() {
        let err = IndexKeyRange::starting_at(index(3), select(&[5], &[1]), true).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::NonLeadingField);

        let err = IndexKeyRange::ending_at(index(3), select(&[1, 5], &[0, 2]), true).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::NonLeadingField);
    }

    #[test]
    fn test_mismatched_selectors() {
        let err = IndexKeyRange::bounded(
            index(3),
            select(&[1, 2], &[0, 1]),
            true,
            select(&[1], &[0]),
            true,
        )
        .unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::MismatchedBounds);
    }

    #[test]
    fn test_mismatch_checked_before_leading() {
        // Position 1 is excluded by both, position 2 by only one: the
        // mismatch at 2 is reported rather than the gap.
        let err = IndexKeyRange::bounded(
            index(3),
            select(&[1, 3], &[0, 2]),
            true,
            select(&[1], &[0]),
            true,
        )
        .unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::MismatchedBounds);
    }

    #[test]
    fn test_lexicographic_is_orthogonal() {
        let mut range = IndexKeyRange::bounded(
            index(3),
            Some(IndexBound::leading(ints(&[1, 10, 800]))),
            true,
            Some(IndexBound::leading(ints(&[1, 20, 888]))),
            false,
        )
        .unwrap();
        assert!(!range.lexicographic());
        range.set_lexicographic(true);
        assert!(range.lexicographic());
        assert_eq!(range.bound_columns(), 3);
        assert!(range.lo_inclusive());
        assert!(!range.hi_inclusive());
        assert_eq!(range.to_string(), "(>= (1, 10, 800), < (1, 20, 888))");
    }

    #[test]
    fn test_display_one_sided() {
        let range = IndexKeyRange::ending_at(
            index(2),
            Some(IndexBound::new(
                vec![BoundValue::Parameter(0)],
                Arc::new(LeadingFields(1)),
            )),
            false,
        )
        .unwrap();
        assert_eq!(range.to_string(), "(, < ($1))");
    }

    #[test]
    fn test_value_count_must_match_selection() {
        let short = Some(IndexBound::new(ints(&[1]), Arc::new(LeadingFields(3))));
        let err = IndexKeyRange::starting_at(index(3), short, true).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidArgument);
        assert_eq!(
            err.message(),
            "IndexBound lo has 1 values for 3 bound fields of index idx"
        );

        // Positions past the last field select nothing
        let err = IndexKeyRange::ending_at(index(2), select(&[1, 2, 3], &[0, 1, 2]), true)
            .unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidArgument);

        let err = IndexKeyRange::bounded(
            index(2),
            select(&[1, 2], &[0, 1]),
            true,
            select(&[9], &[0, 1]),
            true,
        )
        .unwrap_err();
        assert!(err.message().starts_with("IndexBound hi has 1 values"));
    }
}
