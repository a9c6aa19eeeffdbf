//! Reconcile orchestrator with boundary logging.
//!
//! One `reconcile` call walks the phases
//! `start → loaded → diffed → deleting → adding → saved`, or ends in
//! `failed`. Nothing is retained between calls except the store's baseline.
//!
//! ## Logging Ownership
//!
//! The engine owns lifecycle logging for a reconcile:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Phase transitions and per-route operations are `tracing::debug!` /
//! `tracing::warn!` events carrying the `reconcile_id`.

use std::fmt;
use std::sync::Arc;

use routesync_core::apply::{
    applied_after, OpOutcome, Operation, OperationFailure, OperationRecord,
};
use routesync_core::diff::{diff_routes_with, route_set_digest, DiffResult, DuplicatePolicy};
use routesync_core::errors::{ManagerError, RsError, RsErrorKind, StoreError, ValidationError};
use routesync_core::{log_op_end, log_op_error, log_op_start};
use routesync_core::{NormalizedRoute, Route, RouteManager, RouteStore};
use routesync_core_types::ReconcileId;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Step of a reconcile run, as logged in the `phase` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Start,
    Loaded,
    Diffed,
    Deleting,
    Adding,
    Saved,
    Failed,
}

impl ReconcilePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcilePhase::Start => "start",
            ReconcilePhase::Loaded => "loaded",
            ReconcilePhase::Diffed => "diffed",
            ReconcilePhase::Deleting => "deleting",
            ReconcilePhase::Adding => "adding",
            ReconcilePhase::Saved => "saved",
            ReconcilePhase::Failed => "failed",
        }
    }
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a reconcile computed and did
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub reconcile_id: ReconcileId,
    /// The plan computed from the loaded baseline
    pub diff: DiffResult,
    /// The set handed to the store, sorted by key
    pub applied: Vec<NormalizedRoute>,
    /// One record per manager call, in issue order
    pub outcomes: Vec<OperationRecord>,
}

impl ReconcileReport {
    pub fn failures(&self) -> Vec<OperationFailure> {
        self.outcomes
            .iter()
            .filter_map(OperationRecord::failure)
            .collect()
    }
}

/// A reconcile that got as far as applying but did not fully converge
#[derive(Debug, Clone)]
pub struct PartialFailure {
    pub report: ReconcileReport,
    /// Failed operations, in issue order
    pub failures: Vec<OperationFailure>,
    /// Set when persisting the applied baseline failed
    pub save_error: Option<StoreError>,
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reconcile {} incomplete: {} operation(s) failed",
            self.report.reconcile_id,
            self.failures.len()
        )?;
        if self.save_error.is_some() {
            f.write_str(", baseline not saved")?;
        }
        for failure in &self.failures {
            write!(f, "\n{}", failure)?;
        }
        if let Some(err) = &self.save_error {
            write!(f, "\nsave baseline: {}", err)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone)]
pub enum ReconcileError {
    /// A collaborator was not configured; nothing was read or changed
    #[error("reconciler misconfigured: {0}")]
    Configuration(&'static str),

    /// The baseline could not be loaded; nothing was changed
    #[error("load baseline: {0}")]
    Load(#[source] StoreError),

    /// A baseline or desired route is malformed; nothing was changed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Some operations or the final save failed; the plan and the applied
    /// set are in the carried report
    #[error("{0}")]
    Partial(Box<PartialFailure>),
}

impl ReconcileError {
    /// The plan, when the run got past diffing
    pub fn diff(&self) -> Option<&DiffResult> {
        match self {
            ReconcileError::Partial(partial) => Some(&partial.report.diff),
            _ => None,
        }
    }

    pub fn kind(&self) -> RsErrorKind {
        match self {
            ReconcileError::Configuration(_) => RsErrorKind::Configuration,
            ReconcileError::Load(_) => RsErrorKind::Persistence,
            ReconcileError::Validation(_) => RsErrorKind::Validation,
            ReconcileError::Partial(partial) => {
                if partial.failures.is_empty() {
                    RsErrorKind::Persistence
                } else if partial.failures.iter().all(OperationFailure::is_cancelled) {
                    RsErrorKind::Cancelled
                } else {
                    RsErrorKind::Apply
                }
            }
        }
    }
}

impl From<&ReconcileError> for RsError {
    fn from(err: &ReconcileError) -> Self {
        RsError::new(err.kind())
            .with_op("reconcile")
            .with_message(err.to_string())
    }
}

/// Drives one reconciliation per `reconcile` call.
///
/// Collaborators are optional so that a missing one is reported as a
/// `Configuration` error at call time rather than at construction.
#[derive(Clone, Default)]
pub struct Reconciler {
    manager: Option<Arc<dyn RouteManager>>,
    store: Option<Arc<dyn RouteStore>>,
    duplicates: DuplicatePolicy,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("manager", &self.manager.is_some())
            .field("store", &self.store.is_some())
            .field("duplicates", &self.duplicates)
            .finish()
    }
}

#[derive(Default)]
pub struct ReconcilerBuilder {
    inner: Reconciler,
}

impl ReconcilerBuilder {
    pub fn manager(mut self, manager: Arc<dyn RouteManager>) -> Self {
        self.inner.manager = Some(manager);
        self
    }

    pub fn store(mut self, store: Arc<dyn RouteStore>) -> Self {
        self.inner.store = Some(store);
        self
    }

    /// Duplicate-key handling for both the baseline and the desired set
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.inner.duplicates = policy;
        self
    }

    pub fn build(self) -> Reconciler {
        self.inner
    }
}

impl Reconciler {
    pub fn new(manager: Arc<dyn RouteManager>, store: Arc<dyn RouteStore>) -> Self {
        Self::builder().manager(manager).store(store).build()
    }

    pub fn builder() -> ReconcilerBuilder {
        ReconcilerBuilder::default()
    }

    /// Converge the host onto `desired`, the complete route set.
    ///
    /// Deletions run before additions, each in key order. The set that is
    /// actually in place afterwards is saved as the new baseline even when
    /// some operations failed or `cancel` fired; only what succeeded is
    /// recorded.
    ///
    /// # Errors
    ///
    /// - `Configuration`: manager or store missing (no I/O performed)
    /// - `Load`: the baseline could not be read (no changes made)
    /// - `Validation`: a route in the baseline or `desired` is malformed
    ///   (no changes made)
    /// - `Partial`: one or more operations failed, were cancelled, or the
    ///   final save failed
    pub async fn reconcile(
        &self,
        desired: &[Route],
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport, ReconcileError> {
        let reconcile_id = ReconcileId::new();
        log_op_start!(
            "reconcile",
            reconcile_id = %reconcile_id,
            desired = desired.len()
        );
        let start = std::time::Instant::now();

        let result = self.reconcile_impl(&reconcile_id, desired, cancel).await;

        match &result {
            Ok(report) => {
                let counts = report.diff.counts();
                log_op_end!(
                    "reconcile",
                    duration_ms = start.elapsed().as_millis() as u64,
                    reconcile_id = %reconcile_id,
                    to_add = counts.to_add,
                    to_del = counts.to_del,
                    unchanged = counts.unchanged,
                    applied = report.applied.len()
                );
            }
            Err(err) => {
                tracing::debug!(
                    reconcile_id = %reconcile_id,
                    phase = ReconcilePhase::Failed.as_str(),
                    "Reconcile failed"
                );
                log_op_error!(
                    "reconcile",
                    err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    reconcile_id = %reconcile_id
                );
            }
        }

        result
    }

    async fn reconcile_impl(
        &self,
        reconcile_id: &ReconcileId,
        desired: &[Route],
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport, ReconcileError> {
        let manager = self
            .manager
            .as_deref()
            .ok_or(ReconcileError::Configuration("route manager is required"))?;
        let store = self
            .store
            .as_deref()
            .ok_or(ReconcileError::Configuration("route store is required"))?;

        tracing::debug!(
            reconcile_id = %reconcile_id,
            phase = ReconcilePhase::Start.as_str(),
            "Loading baseline"
        );
        let baseline = store.load().map_err(ReconcileError::Load)?;
        tracing::debug!(
            reconcile_id = %reconcile_id,
            phase = ReconcilePhase::Loaded.as_str(),
            baseline = baseline.len(),
            "Baseline loaded"
        );

        let diff = diff_routes_with(&baseline, desired, self.duplicates)?;
        let counts = diff.counts();
        tracing::debug!(
            reconcile_id = %reconcile_id,
            phase = ReconcilePhase::Diffed.as_str(),
            to_add = counts.to_add,
            to_del = counts.to_del,
            unchanged = counts.unchanged,
            "Plan computed"
        );

        let mut outcomes = Vec::with_capacity(counts.to_add + counts.to_del);

        tracing::debug!(
            reconcile_id = %reconcile_id,
            phase = ReconcilePhase::Deleting.as_str(),
            "Applying deletions"
        );
        for route in &diff.to_del {
            let outcome = apply_one(manager, Operation::Delete, route, cancel, reconcile_id).await;
            outcomes.push(OperationRecord {
                op: Operation::Delete,
                route: route.clone(),
                outcome,
            });
        }

        tracing::debug!(
            reconcile_id = %reconcile_id,
            phase = ReconcilePhase::Adding.as_str(),
            "Applying additions"
        );
        for route in &diff.to_add {
            let outcome = apply_one(manager, Operation::Add, route, cancel, reconcile_id).await;
            outcomes.push(OperationRecord {
                op: Operation::Add,
                route: route.clone(),
                outcome,
            });
        }

        let applied = applied_after(&diff, &outcomes);
        let to_save: Vec<Route> = applied.iter().map(|r| r.as_route().clone()).collect();
        let save_error = match store.save(&to_save) {
            Ok(()) => {
                tracing::debug!(
                    reconcile_id = %reconcile_id,
                    applied = applied.len(),
                    digest = %route_set_digest(&applied),
                    "Baseline written"
                );
                None
            }
            Err(err) => {
                tracing::warn!(
                    reconcile_id = %reconcile_id,
                    error = %err,
                    "Saving baseline failed"
                );
                Some(err)
            }
        };

        let report = ReconcileReport {
            reconcile_id: reconcile_id.clone(),
            diff,
            applied,
            outcomes,
        };
        let failures = report.failures();

        if failures.is_empty() && save_error.is_none() {
            tracing::debug!(
                reconcile_id = %reconcile_id,
                phase = ReconcilePhase::Saved.as_str(),
                applied = report.applied.len(),
                "Reconcile converged"
            );
            Ok(report)
        } else {
            Err(ReconcileError::Partial(Box::new(PartialFailure {
                report,
                failures,
                save_error,
            })))
        }
    }
}

/// Issue one manager call, racing it against `cancel`.
///
/// Nothing is issued once `cancel` has fired. A delete of an absent route
/// counts as success.
async fn apply_one(
    manager: &dyn RouteManager,
    op: Operation,
    route: &NormalizedRoute,
    cancel: &CancellationToken,
    reconcile_id: &ReconcileId,
) -> OpOutcome {
    let key = route.key();

    let result = if cancel.is_cancelled() {
        Err(ManagerError::Cancelled)
    } else {
        let call = async {
            match op {
                Operation::Delete => manager.delete(route.as_route(), cancel).await,
                Operation::Add => manager.add(route.as_route(), cancel).await,
            }
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ManagerError::Cancelled),
            result = call => result,
        }
    };

    match result {
        Ok(()) => {
            tracing::debug!(
                reconcile_id = %reconcile_id,
                op = op.as_str(),
                route_key = %key,
                "Route applied"
            );
            OpOutcome::Succeeded
        }
        Err(ManagerError::RouteNotFound) if op == Operation::Delete => {
            tracing::debug!(
                reconcile_id = %reconcile_id,
                op = op.as_str(),
                route_key = %key,
                "Route already absent"
            );
            OpOutcome::Succeeded
        }
        Err(err) => {
            let rs_err = RsError::from(err.clone())
                .with_op(op.as_str())
                .with_route_key(key.as_str());
            tracing::warn!(
                reconcile_id = %reconcile_id,
                op = op.as_str(),
                route_key = %key,
                err_code = rs_err.code(),
                error = %rs_err,
                "Route operation failed"
            );
            OpOutcome::Failed(err)
        }
    }
}
