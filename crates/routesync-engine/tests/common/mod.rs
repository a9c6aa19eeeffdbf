//! Shared fakes for reconcile tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use routesync_core::errors::{ManagerError, StoreError};
use routesync_core::{MemoryStore, Route, RouteManager, RouteStore};
use tokio_util::sync::CancellationToken;

/// What a `FakeManager` does when it sees a destination
#[derive(Debug, Clone)]
pub enum Behavior {
    Fail(ManagerError),
    /// Block until cancelled
    Hang,
    /// Cancel the token after succeeding
    CancelAfter(CancellationToken),
}

/// Records calls as `"add <dst>"` / `"delete <dst>"`.
#[derive(Default)]
pub struct FakeManager {
    pub calls: Mutex<Vec<String>>,
    pub behaviors: HashMap<String, Behavior>,
}

impl FakeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dst: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(dst.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn call(
        &self,
        verb: &str,
        route: &Route,
        cancel: &CancellationToken,
    ) -> Result<(), ManagerError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", verb, route.destination));
        match self.behaviors.get(&route.destination) {
            None => Ok(()),
            Some(Behavior::Fail(err)) => Err(err.clone()),
            Some(Behavior::Hang) => {
                cancel.cancelled().await;
                Err(ManagerError::Cancelled)
            }
            Some(Behavior::CancelAfter(token)) => {
                token.cancel();
                Ok(())
            }
        }
    }
}

#[async_trait]
impl RouteManager for FakeManager {
    async fn list(&self, _cancel: &CancellationToken) -> Result<Vec<Route>, ManagerError> {
        Ok(Vec::new())
    }

    async fn add(&self, route: &Route, cancel: &CancellationToken) -> Result<(), ManagerError> {
        self.call("add", route, cancel).await
    }

    async fn delete(&self, route: &Route, cancel: &CancellationToken) -> Result<(), ManagerError> {
        self.call("delete", route, cancel).await
    }
}

/// A `MemoryStore` that counts saves and can be told to fail
#[derive(Default)]
pub struct FakeStore {
    pub inner: MemoryStore,
    pub saves: AtomicUsize,
    pub load_error: Option<StoreError>,
    pub save_error: Option<StoreError>,
}

impl FakeStore {
    pub fn with_baseline(routes: Vec<Route>) -> Self {
        Self {
            inner: MemoryStore::with_routes(routes),
            ..Self::default()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn baseline(&self) -> Vec<Route> {
        self.inner.load().unwrap()
    }
}

impl RouteStore for FakeStore {
    fn load(&self) -> Result<Vec<Route>, StoreError> {
        match &self.load_error {
            Some(err) => Err(err.clone()),
            None => self.inner.load(),
        }
    }

    fn save(&self, routes: &[Route]) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        match &self.save_error {
            Some(err) => Err(err.clone()),
            None => self.inner.save(routes),
        }
    }
}

pub fn dsts(routes: &[Route]) -> Vec<String> {
    routes.iter().map(|r| r.destination.clone()).collect()
}
