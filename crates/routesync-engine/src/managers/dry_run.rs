//! A manager that only records what it was asked to do.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use routesync_core::errors::ManagerError;
use routesync_core::{NormalizedRoute, Route, RouteKey, RouteManager};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct DryRunState {
    current: BTreeMap<RouteKey, NormalizedRoute>,
    operations: Vec<String>,
}

/// In-memory `RouteManager` for `--dry-run` and tests.
///
/// Keeps a simulated route table and a log of `DEL <key>` / `ADD <key>`
/// lines in call order. Never touches the host.
#[derive(Debug, Default)]
pub struct DryRunManager {
    state: Mutex<DryRunState>,
}

impl DryRunManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a simulated table holding `routes`
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::Validation` if any route does not normalize.
    pub fn with_routes(routes: &[Route]) -> Result<Self, ManagerError> {
        let mut current = BTreeMap::new();
        for route in routes {
            let normalized = route.normalize()?;
            current.insert(normalized.key(), normalized);
        }
        Ok(Self {
            state: Mutex::new(DryRunState {
                current,
                operations: Vec::new(),
            }),
        })
    }

    /// Recorded operations, in call order
    pub fn operations(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.operations.clone())
            .unwrap_or_default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut DryRunState) -> T) -> Result<T, ManagerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ManagerError::backend("dry-run state lock poisoned"))?;
        Ok(f(&mut state))
    }
}

#[async_trait]
impl RouteManager for DryRunManager {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Route>, ManagerError> {
        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }
        self.with_state(|s| s.current.values().map(|r| r.as_route().clone()).collect())
    }

    async fn add(&self, route: &Route, cancel: &CancellationToken) -> Result<(), ManagerError> {
        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }
        let route = route.normalize()?;
        let key = route.key();
        self.with_state(|s| {
            s.operations.push(format!("ADD {}", key));
            s.current.insert(key, route);
        })
    }

    async fn delete(&self, route: &Route, cancel: &CancellationToken) -> Result<(), ManagerError> {
        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }
        let key = route.normalize()?.key();
        self.with_state(|s| {
            s.operations.push(format!("DEL {}", key));
            s.current.remove(&key);
        })
    }
}
