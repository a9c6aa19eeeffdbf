//! Apply outcomes and the applied-baseline fold.
//!
//! The orchestrator records one [`OperationRecord`] per manager call. The
//! set of routes that is actually in place afterwards is a pure function of
//! the plan and those records, computed by [`applied_after`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::DiffResult;
use crate::errors::{ManagerError, RsError};
use crate::model::NormalizedRoute;

/// Kind of manager call issued for one route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Delete,
    Add,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Delete => "delete",
            Operation::Add => "add",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    Succeeded,
    Failed(ManagerError),
}

impl OpOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OpOutcome::Succeeded)
    }
}

/// One manager call and how it ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub op: Operation,
    pub route: NormalizedRoute,
    pub outcome: OpOutcome,
}

impl OperationRecord {
    pub fn succeeded(op: Operation, route: NormalizedRoute) -> Self {
        Self {
            op,
            route,
            outcome: OpOutcome::Succeeded,
        }
    }

    pub fn failed(op: Operation, route: NormalizedRoute, error: ManagerError) -> Self {
        Self {
            op,
            route,
            outcome: OpOutcome::Failed(error),
        }
    }

    /// The failure carried by this record, if any
    pub fn failure(&self) -> Option<OperationFailure> {
        match &self.outcome {
            OpOutcome::Succeeded => None,
            OpOutcome::Failed(error) => Some(OperationFailure {
                op: self.op,
                route: self.route.clone(),
                error: error.clone(),
            }),
        }
    }
}

/// A failed add or delete, with the route it concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub op: Operation,
    pub route: NormalizedRoute,
    pub error: ManagerError,
}

impl OperationFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, ManagerError::Cancelled)
    }
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} route {}: {}", self.op, self.route, self.error)
    }
}

impl std::error::Error for OperationFailure {}

impl From<&OperationFailure> for RsError {
    fn from(failure: &OperationFailure) -> Self {
        RsError::from(failure.error.clone())
            .with_op(failure.op.as_str())
            .with_route_key(failure.route.key().into_string())
    }
}

/// Routes in place after applying `records` to the baseline of `plan`.
///
/// Starts from `unchanged ∪ to_del` (everything the baseline had). A
/// successful delete removes its key, a successful add inserts it; failed
/// operations leave the set untouched. Output is sorted by key.
pub fn applied_after(plan: &DiffResult, records: &[OperationRecord]) -> Vec<NormalizedRoute> {
    let mut applied: BTreeMap<_, _> = plan
        .unchanged
        .iter()
        .chain(plan.to_del.iter())
        .map(|r| (r.key(), r.clone()))
        .collect();

    for record in records {
        if !record.outcome.is_success() {
            continue;
        }
        match record.op {
            Operation::Delete => {
                applied.remove(&record.route.key());
            }
            Operation::Add => {
                applied.insert(record.route.key(), record.route.clone());
            }
        }
    }

    applied.into_values().collect()
}
