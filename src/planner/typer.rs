//! Type resolution
//!
//! Assigns a result type to every bound expression and infers parameter
//! types from context. A caller-supplied hint always wins; otherwise the
//! first context that implies a type fixes it (compared column, assigned
//! column, the other arithmetic operand). A parameter no context reaches
//! stays unresolved.

use crate::catalog::DataType;

use super::binder::BoundExpr;
use super::errors::{PlannerError, PlannerResult};

/// Per-statement type resolver, owning the parameter type slots
#[derive(Debug, Clone)]
pub struct TypeResolver {
    parameters: Vec<Option<DataType>>,
}

impl TypeResolver {
    /// `count` parameter slots, pre-filled from `hints` by position
    pub fn new(count: usize, hints: &[Option<DataType>]) -> Self {
        Self {
            parameters: (0..count).map(|i| hints.get(i).copied().flatten()).collect(),
        }
    }

    pub fn parameter_types(&self) -> &[Option<DataType>] {
        &self.parameters
    }

    pub fn into_parameter_types(self) -> Vec<Option<DataType>> {
        self.parameters
    }

    /// Type of `expr`; `None` when nothing determines it
    pub fn resolve(&mut self, expr: &BoundExpr) -> PlannerResult<Option<DataType>> {
        match expr {
            BoundExpr::Column(c) => Ok(c.data_type),
            BoundExpr::Literal(v) => Ok(v.data_type()),
            BoundExpr::Parameter(i) => Ok(self.parameters.get(*i).copied().flatten()),
            BoundExpr::Binary { op, left, right } if op.is_comparison() => {
                self.compare(expr, left, right)?;
                Ok(Some(DataType::Boolean))
            }
            BoundExpr::Binary { op, left, right } if op.is_logical() => {
                self.expect_boolean(left)?;
                self.expect_boolean(right)?;
                Ok(Some(DataType::Boolean))
            }
            BoundExpr::Binary { left, right, .. } => self.arithmetic(expr, left, right),
            BoundExpr::Not(inner) => {
                self.expect_boolean(inner)?;
                Ok(Some(DataType::Boolean))
            }
            BoundExpr::IsNull { expr, .. } => {
                if !matches!(**expr, BoundExpr::Row(_)) {
                    self.resolve(expr)?;
                }
                Ok(Some(DataType::Boolean))
            }
            BoundExpr::Between {
                expr: operand,
                low,
                high,
                ..
            } => {
                self.compare(expr, operand, low)?;
                self.compare(expr, operand, high)?;
                Ok(Some(DataType::Boolean))
            }
            BoundExpr::Row(_) => Err(PlannerError::invalid_statement(format!(
                "Row value {} is only allowed in a comparison",
                expr
            ))),
        }
    }

    /// Checks that a WHERE clause is a boolean predicate
    pub fn resolve_predicate(&mut self, expr: &BoundExpr) -> PlannerResult<()> {
        self.expect_boolean(expr)
    }

    /// Checks `expr` can be stored in a column of type `target`
    pub fn expect(&mut self, expr: &BoundExpr, target: Option<DataType>) -> PlannerResult<()> {
        match (self.resolve(expr)?, target) {
            (None, _) => {
                self.infer(expr, target);
                Ok(())
            }
            (Some(actual), Some(target)) if !actual.comparable_with(&target) => Err(
                PlannerError::type_mismatch(
                    expr.to_string(),
                    format!("cannot assign {} to {}", actual, target),
                ),
            ),
            _ => Ok(()),
        }
    }

    fn expect_boolean(&mut self, expr: &BoundExpr) -> PlannerResult<()> {
        match self.resolve(expr)? {
            None => {
                self.infer(expr, Some(DataType::Boolean));
                Ok(())
            }
            Some(DataType::Boolean) => Ok(()),
            Some(other) => Err(PlannerError::type_mismatch(
                expr.to_string(),
                format!("expected boolean, found {}", other),
            )),
        }
    }

    fn compare(
        &mut self,
        whole: &BoundExpr,
        left: &BoundExpr,
        right: &BoundExpr,
    ) -> PlannerResult<()> {
        match (left, right) {
            (BoundExpr::Row(ls), BoundExpr::Row(rs)) => {
                if ls.len() != rs.len() {
                    return Err(PlannerError::invalid_statement(format!(
                        "Row values of different arity in '{}'",
                        whole
                    )));
                }
                for (l, r) in ls.iter().zip(rs) {
                    self.compare(whole, l, r)?;
                }
                Ok(())
            }
            (BoundExpr::Row(_), _) | (_, BoundExpr::Row(_)) => Err(
                PlannerError::invalid_statement(format!(
                    "Row value compared with a scalar in '{}'",
                    whole
                )),
            ),
            _ => {
                let l = self.resolve(left)?;
                let r = self.resolve(right)?;
                if l.is_none() {
                    self.infer(left, r);
                }
                if r.is_none() {
                    self.infer(right, l);
                }
                match (l, r) {
                    (Some(a), Some(b)) if !a.comparable_with(&b) => Err(
                        PlannerError::type_mismatch(
                            whole.to_string(),
                            format!("cannot compare {} with {}", a, b),
                        ),
                    ),
                    _ => Ok(()),
                }
            }
        }
    }

    fn arithmetic(
        &mut self,
        whole: &BoundExpr,
        left: &BoundExpr,
        right: &BoundExpr,
    ) -> PlannerResult<Option<DataType>> {
        let l = self.resolve(left)?;
        let r = self.resolve(right)?;
        if l.is_none() {
            self.infer(left, r);
        }
        if r.is_none() {
            self.infer(right, l);
        }
        for t in [l, r].into_iter().flatten() {
            if !t.is_numeric() {
                return Err(PlannerError::type_mismatch(
                    whole.to_string(),
                    format!("{} is not numeric", t),
                ));
            }
        }
        Ok(match (l, r) {
            (Some(a), Some(b)) => a.promote(b),
            (a, b) => a.or(b),
        })
    }

    /// Fixes the type of an unresolved parameter slot
    fn infer(&mut self, expr: &BoundExpr, ty: Option<DataType>) {
        let (BoundExpr::Parameter(i), Some(ty)) = (expr, ty) else {
            return;
        };
        if let Some(slot @ None) = self.parameters.get_mut(*i) {
            *slot = Some(ty);
        }
    }
}
