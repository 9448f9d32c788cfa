//! Explain output
//!
//! Produces deterministic, human-readable explain output for an accepted,
//! rejected or not-applicable compilation.

use std::fmt;

use crate::catalog::DataType;

use super::errors::PlannerError;
use super::plan::CompiledPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplainStatus {
    Accepted,
    Rejected,
    /// Schema-modifying statement, applied by DDL dispatch
    NotApplicable,
}

impl ExplainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplainStatus::Accepted => "ACCEPTED",
            ExplainStatus::Rejected => "REJECTED",
            ExplainStatus::NotApplicable => "NOT APPLICABLE",
        }
    }
}

/// Explain plan output
#[derive(Debug, Clone)]
pub struct ExplainPlan {
    pub status: ExplainStatus,
    pub statement: Option<String>,
    /// "query" or "modify" (if accepted)
    pub kind: Option<&'static str>,
    /// Operator tree, one line per operator
    pub operators: Vec<String>,
    /// `name: type` per result column
    pub result_columns: Vec<String>,
    pub parameter_types: Vec<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
}

fn type_name(t: Option<DataType>) -> &'static str {
    t.map_or("unresolved", |t| t.type_name())
}

impl ExplainPlan {
    fn empty(status: ExplainStatus) -> Self {
        Self {
            status,
            statement: None,
            kind: None,
            operators: Vec::new(),
            result_columns: Vec::new(),
            parameter_types: Vec::new(),
            offset: None,
            limit: None,
            rejection_code: None,
            rejection_reason: None,
        }
    }

    /// Creates an explain plan from a compiled plan
    pub fn from_plan(plan: &CompiledPlan) -> Self {
        Self {
            statement: Some(plan.statement_text.clone()),
            kind: Some(plan.kind()),
            operators: plan.root.to_string().lines().map(str::to_string).collect(),
            result_columns: plan
                .result_columns
                .iter()
                .map(|c| format!("{}: {}", c.name, type_name(c.data_type)))
                .collect(),
            parameter_types: plan
                .parameter_types
                .iter()
                .enumerate()
                .map(|(i, t)| format!("${}: {}", i + 1, type_name(*t)))
                .collect(),
            offset: plan.offset,
            limit: plan.limit,
            ..Self::empty(ExplainStatus::Accepted)
        }
    }

    /// Creates an explain plan from a compilation error
    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            rejection_code: Some(err.code().code().to_string()),
            rejection_reason: Some(err.message().to_string()),
            ..Self::empty(ExplainStatus::Rejected)
        }
    }

    pub fn not_applicable(statement_text: impl Into<String>) -> Self {
        Self {
            statement: Some(statement_text.into()),
            ..Self::empty(ExplainStatus::NotApplicable)
        }
    }

    pub fn accepted(&self) -> bool {
        self.status == ExplainStatus::Accepted
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Status: {}", self.status.as_str())?;
        if let Some(statement) = &self.statement {
            writeln!(f, "Statement: {}", statement)?;
        }
        if let Some(kind) = self.kind {
            writeln!(f, "Kind: {}", kind)?;
        }
        if !self.operators.is_empty() {
            writeln!(f, "Operators:")?;
            for line in &self.operators {
                writeln!(f, "  {}", line)?;
            }
        }
        if !self.result_columns.is_empty() {
            writeln!(f, "Result Columns:")?;
            for column in &self.result_columns {
                writeln!(f, "  - {}", column)?;
            }
        }
        if !self.parameter_types.is_empty() {
            writeln!(f, "Parameters:")?;
            for param in &self.parameter_types {
                writeln!(f, "  - {}", param)?;
            }
        }
        if let Some(offset) = self.offset {
            writeln!(f, "Offset: {}", offset)?;
        }
        if let Some(limit) = self.limit {
            writeln!(f, "Limit: {}", limit)?;
        }
        if let Some(code) = &self.rejection_code {
            writeln!(f, "Error Code: {}", code)?;
        }
        if let Some(reason) = &self.rejection_reason {
            writeln!(f, "Reason: {}", reason)?;
        }
        Ok(())
    }
}
