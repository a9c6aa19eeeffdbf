//! routesync engine - reconciliation orchestration
//!
//! Provides the `Reconciler`, which drives load → diff → delete-then-add →
//! save against a `RouteManager` and a `RouteStore`, and the manager
//! backends:
//! - `IpCommandManager`: the host routing table through iproute2's `ip`
//! - `DryRunManager`: records the plan without touching the host

pub mod managers;
pub mod reconciler;

// Re-export key types
pub use managers::{DryRunManager, IpCommandManager};
pub use reconciler::{
    PartialFailure, ReconcileError, ReconcilePhase, ReconcileReport, Reconciler,
    ReconcilerBuilder,
};
