//! routesync core - route identity, set diffing and reconciliation contracts
//!
//! This crate provides the pure building blocks of route reconciliation:
//! - `Route` model with normalization and the full-field identity key
//! - Recognized scope/type/protocol vocabularies
//! - Deterministic set diff between a baseline and a desired full route set
//! - `RouteManager` / `RouteStore` collaborator contracts and an in-memory store
//! - The applied-set fold used to keep the baseline truthful on partial failure
//! - Error and logging facilities shared by the other routesync crates

pub mod apply;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod manager;
pub mod model;
pub mod store;

// Re-export commonly used types
pub use apply::{applied_after, OpOutcome, Operation, OperationFailure, OperationRecord};
pub use diff::{diff_routes, diff_routes_with, DiffResult, DuplicatePolicy};
pub use errors::{
    ManagerError, RouteSetSide, RsError, RsErrorKind, StoreError, ValidationError,
};
pub use manager::RouteManager;
pub use model::{NormalizedRoute, Route, RouteKey};
pub use store::{MemoryStore, RouteStore};
