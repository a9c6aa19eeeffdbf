//! Diff output types.

use serde::{Deserialize, Serialize};

use crate::model::NormalizedRoute;

/// The plan computed from a baseline set to a desired set.
///
/// All three sequences hold normalized routes sorted ascending by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Routes in the desired set but not in the baseline
    pub to_add: Vec<NormalizedRoute>,
    /// Routes in the baseline but not in the desired set
    pub to_del: Vec<NormalizedRoute>,
    /// Routes present in both (the baseline's copy)
    pub unchanged: Vec<NormalizedRoute>,
}

impl DiffResult {
    /// True when applying the plan requires no manager calls
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_del.is_empty()
    }

    pub fn counts(&self) -> DiffCounts {
        DiffCounts {
            to_add: self.to_add.len(),
            to_del: self.to_del.len(),
            unchanged: self.unchanged.len(),
        }
    }
}

/// Sizes of the three diff sequences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounts {
    pub to_add: usize,
    pub to_del: usize,
    pub unchanged: usize,
}

/// How an input set containing two routes with the same key is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The later route silently replaces the earlier one
    #[default]
    LastWins,
    /// The diff fails with `ValidationError::DuplicateRoute`
    Reject,
}
