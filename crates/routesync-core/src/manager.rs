//! OS route manager capability.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::ManagerError;
use crate::model::Route;

/// Lists, installs and removes routes on the host.
///
/// Implementations must observe `cancel`: once it fires, an in-flight call
/// should return `ManagerError::Cancelled` as soon as it can.
#[async_trait]
pub trait RouteManager: Send + Sync {
    /// Routes currently installed
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Route>, ManagerError>;

    /// Install `route`, replacing an existing entry; idempotent
    async fn add(&self, route: &Route, cancel: &CancellationToken) -> Result<(), ManagerError>;

    /// Remove `route`. An absent route may be reported as
    /// `ManagerError::RouteNotFound`, which callers treat as success.
    async fn delete(&self, route: &Route, cancel: &CancellationToken)
        -> Result<(), ManagerError>;
}
