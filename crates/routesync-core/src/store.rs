//! Baseline persistence capability.

use std::sync::Mutex;

use crate::errors::StoreError;
use crate::model::Route;

/// Persists the full route set last known to be applied.
pub trait RouteStore: Send + Sync {
    /// The last saved set; empty if nothing was ever saved
    ///
    /// # Errors
    ///
    /// Backend-specific read or decode failures.
    fn load(&self) -> Result<Vec<Route>, StoreError>;

    /// Atomically replace the saved set. Routes are normalized before they
    /// are persisted; an invalid route fails the whole save.
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidRoute` or a backend write failure.
    fn save(&self, routes: &[Route]) -> Result<(), StoreError>;
}

/// Normalize every route, failing with the index of the first bad one.
///
/// # Errors
///
/// `StoreError::InvalidRoute` for the first route that fails normalization.
pub fn normalize_for_save(routes: &[Route]) -> Result<Vec<Route>, StoreError> {
    routes
        .iter()
        .enumerate()
        .map(|(index, route)| {
            route
                .normalize()
                .map(Route::from)
                .map_err(|source| StoreError::InvalidRoute { index, source })
        })
        .collect()
}

/// In-process store, for tests and one-shot runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    routes: Mutex<Vec<Route>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose baseline is `routes` as given (not normalized)
    pub fn with_routes(routes: Vec<Route>) -> Self {
        Self {
            routes: Mutex::new(routes),
        }
    }
}

impl RouteStore for MemoryStore {
    fn load(&self) -> Result<Vec<Route>, StoreError> {
        let guard = self
            .routes
            .lock()
            .map_err(|_| StoreError::backend("memory store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, routes: &[Route]) -> Result<(), StoreError> {
        let normalized = normalize_for_save(routes)?;
        let mut guard = self
            .routes
            .lock()
            .map_err(|_| StoreError::backend("memory store lock poisoned"))?;
        *guard = normalized;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_normalizes_on_save() {
        let store = MemoryStore::new();
        store
            .save(&[Route::new(" 10.0.0.1/24 ").with_device("eth0")])
            .unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].destination, "10.0.0.0/24");
    }

    #[test]
    fn test_memory_store_rejects_invalid_route() {
        let store = MemoryStore::with_routes(vec![Route::new("default")]);
        let err = store
            .save(&[Route::new("default"), Route::new("bogus")])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoute { index: 1, .. }));
        // failed save leaves the previous baseline in place
        assert_eq!(store.load().unwrap(), vec![Route::new("default")]);
    }
}
