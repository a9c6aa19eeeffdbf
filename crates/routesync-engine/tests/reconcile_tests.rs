#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{dsts, Behavior, FakeManager, FakeStore};
use routesync_core::errors::{ManagerError, RsErrorKind, StoreError, ValidationError};
use routesync_core::{DuplicatePolicy, Route, RouteStore};
use routesync_engine::{DryRunManager, ReconcileError, Reconciler};
use routesync_store::FileStore;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn reconciler(manager: &Arc<FakeManager>, store: &Arc<FakeStore>) -> Reconciler {
    Reconciler::new(manager.clone(), store.clone())
}

fn partial(err: ReconcileError) -> Box<routesync_engine::PartialFailure> {
    match err {
        ReconcileError::Partial(p) => p,
        other => panic!("expected partial failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_default_route_replaced_by_specific_route() {
    let manager = Arc::new(FakeManager::new());
    let store = Arc::new(FakeStore::with_baseline(vec![Route::new("default")
        .with_gateway("10.0.0.1")
        .with_device("eth0")]));
    let desired = vec![Route::new("192.168.2.0/24")
        .with_gateway("10.0.0.2")
        .with_device("eth0")];

    let report = reconciler(&manager, &store)
        .reconcile(&desired, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(manager.calls(), vec!["delete default", "add 192.168.2.0/24"]);
    assert_eq!(report.diff.to_del.len(), 1);
    assert_eq!(report.diff.to_add.len(), 1);
    assert_eq!(store.baseline(), desired);
    assert!(report.failures().is_empty());
}

#[tokio::test]
async fn test_all_deletes_before_adds_in_key_order() {
    let manager = Arc::new(FakeManager::new());
    let store = Arc::new(FakeStore::with_baseline(vec![
        Route::new("10.2.0.0/16"),
        Route::new("10.1.0.0/16"),
    ]));
    let desired = vec![Route::new("10.4.0.0/16"), Route::new("10.3.0.0/16")];

    reconciler(&manager, &store)
        .reconcile(&desired, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        manager.calls(),
        vec![
            "delete 10.1.0.0/16",
            "delete 10.2.0.0/16",
            "add 10.3.0.0/16",
            "add 10.4.0.0/16",
        ]
    );
}

#[tokio::test]
async fn test_identical_sets_make_no_calls_but_still_save() {
    let routes = vec![Route::new("default").with_gateway("10.0.0.1")];
    let manager = Arc::new(FakeManager::new());
    let store = Arc::new(FakeStore::with_baseline(routes.clone()));

    let report = reconciler(&manager, &store)
        .reconcile(&routes, &CancellationToken::new())
        .await
        .unwrap();

    assert!(manager.calls().is_empty());
    assert_eq!(store.saves(), 1);
    assert!(report.diff.is_empty());
    assert_eq!(report.applied.len(), 1);
}

#[tokio::test]
async fn test_delete_not_found_counts_as_success() {
    let manager =
        Arc::new(FakeManager::new().with("default", Behavior::Fail(ManagerError::RouteNotFound)));
    let store = Arc::new(FakeStore::with_baseline(vec![Route::new("default")]));

    let report = reconciler(&manager, &store)
        .reconcile(&[], &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.applied.is_empty());
    assert!(store.baseline().is_empty());
}

#[tokio::test]
async fn test_partial_failure_keeps_baseline_truthful() {
    let manager = Arc::new(
        FakeManager::new()
            .with("10.1.0.0/16", Behavior::Fail(ManagerError::backend("busy")))
            .with("10.9.0.0/16", Behavior::Fail(ManagerError::backend("refused"))),
    );
    let store = Arc::new(FakeStore::with_baseline(vec![
        Route::new("10.1.0.0/16"),
        Route::new("10.2.0.0/16"),
    ]));
    let desired = vec![Route::new("10.8.0.0/16"), Route::new("10.9.0.0/16")];

    let err = reconciler(&manager, &store)
        .reconcile(&desired, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), RsErrorKind::Apply);
    assert_eq!(err.diff().unwrap().to_add.len(), 2);

    // every operation was still attempted
    assert_eq!(manager.calls().len(), 4);

    // failed delete keeps 10.1, failed add leaves out 10.9
    assert_eq!(dsts(&store.baseline()), vec!["10.1.0.0/16", "10.8.0.0/16"]);

    let partial = partial(err);
    assert_eq!(partial.failures.len(), 2);
    assert!(partial.save_error.is_none());
    let text = partial.to_string();
    assert!(text.contains("delete route 10.1.0.0/16: busy"));
    assert!(text.contains("add route 10.9.0.0/16: refused"));
}

#[tokio::test]
async fn test_cancelled_before_start_issues_no_calls() {
    let manager = Arc::new(FakeManager::new());
    let store = Arc::new(FakeStore::with_baseline(vec![
        Route::new("10.1.0.0/16"),
        Route::new("10.2.0.0/16"),
    ]));
    let desired = vec![Route::new("10.2.0.0/16"), Route::new("10.3.0.0/16")];
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = reconciler(&manager, &store)
        .reconcile(&desired, &cancel)
        .await
        .unwrap_err();

    assert!(manager.calls().is_empty());
    assert_eq!(store.saves(), 1);
    // unchanged ∪ to_del
    assert_eq!(dsts(&store.baseline()), vec!["10.1.0.0/16", "10.2.0.0/16"]);
    assert_eq!(err.kind(), RsErrorKind::Cancelled);
    let partial = partial(err);
    assert!(partial.failures.iter().all(|f| f.is_cancelled()));
    assert_eq!(partial.failures.len(), 2);
}

#[tokio::test]
async fn test_cancel_mid_run_stops_remaining_operations() {
    let cancel = CancellationToken::new();
    let manager = Arc::new(
        FakeManager::new().with("10.1.0.0/16", Behavior::CancelAfter(cancel.clone())),
    );
    let store = Arc::new(FakeStore::with_baseline(vec![Route::new("10.1.0.0/16")]));
    let desired = vec![Route::new("10.3.0.0/16"), Route::new("10.4.0.0/16")];

    let err = reconciler(&manager, &store)
        .reconcile(&desired, &cancel)
        .await
        .unwrap_err();

    // the delete went through, neither add was issued
    assert_eq!(manager.calls(), vec!["delete 10.1.0.0/16"]);
    assert!(store.baseline().is_empty());
    assert_eq!(partial(err).failures.len(), 2);
}

#[tokio::test]
async fn test_in_flight_call_is_cancelled() {
    let cancel = CancellationToken::new();
    let manager = Arc::new(FakeManager::new().with("10.3.0.0/16", Behavior::Hang));
    let store = Arc::new(FakeStore::default());
    let desired = vec![Route::new("10.3.0.0/16")];

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = reconciler(&manager, &store)
        .reconcile(&desired, &cancel)
        .await
        .unwrap_err();

    assert_eq!(manager.calls(), vec!["add 10.3.0.0/16"]);
    assert_eq!(store.saves(), 1);
    assert_eq!(err.kind(), RsErrorKind::Cancelled);
}

#[tokio::test]
async fn test_load_failure_makes_no_calls() {
    let manager = Arc::new(FakeManager::new());
    let store = Arc::new(FakeStore {
        load_error: Some(StoreError::backend("disk gone")),
        ..FakeStore::default()
    });

    let err = reconciler(&manager, &store)
        .reconcile(&[Route::new("default")], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Load(_)));
    assert!(manager.calls().is_empty());
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn test_invalid_desired_route_makes_no_calls() {
    let manager = Arc::new(FakeManager::new());
    let store = Arc::new(FakeStore::default());

    let err = reconciler(&manager, &store)
        .reconcile(
            &[Route::new("default"), Route::new("999.0.0.0/8")],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::Validation(ValidationError::AtIndex { index: 1, .. })
    ));
    assert!(manager.calls().is_empty());
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn test_save_failure_is_joined_into_error() {
    let manager = Arc::new(
        FakeManager::new().with("10.5.0.0/16", Behavior::Fail(ManagerError::backend("nope"))),
    );
    let store = Arc::new(FakeStore {
        save_error: Some(StoreError::backend("read-only")),
        ..FakeStore::default()
    });

    let err = reconciler(&manager, &store)
        .reconcile(
            &[Route::new("10.5.0.0/16"), Route::new("10.6.0.0/16")],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    let partial = partial(err);
    assert_eq!(partial.failures.len(), 1);
    assert_eq!(partial.save_error, Some(StoreError::backend("read-only")));
    let applied: Vec<_> = partial
        .report
        .applied
        .iter()
        .map(|r| r.destination.as_str())
        .collect();
    assert_eq!(applied, vec!["10.6.0.0/16"]);
    assert!(partial.to_string().contains("save baseline: read-only"));
}

#[tokio::test]
async fn test_save_failure_alone_is_persistence_error() {
    let manager = Arc::new(FakeManager::new());
    let store = Arc::new(FakeStore {
        save_error: Some(StoreError::EmptyPath),
        ..FakeStore::default()
    });

    let err = reconciler(&manager, &store)
        .reconcile(&[Route::new("default")], &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), RsErrorKind::Persistence);
}

#[tokio::test]
async fn test_strict_mode_rejects_duplicates() {
    let manager = Arc::new(FakeManager::new());
    let store = Arc::new(FakeStore::default());
    let reconciler = Reconciler::builder()
        .manager(manager.clone())
        .store(store.clone())
        .duplicate_policy(DuplicatePolicy::Reject)
        .build();

    let err = reconciler
        .reconcile(
            &[Route::new("10.0.0.1/24"), Route::new("10.0.0.2/24")],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::Validation(ValidationError::DuplicateRoute { .. })
    ));
    assert!(manager.calls().is_empty());
}

#[tokio::test]
async fn test_missing_store_is_configuration_error() {
    let manager = Arc::new(FakeManager::new());
    let reconciler = Reconciler::builder().manager(manager.clone()).build();

    let err = reconciler
        .reconcile(&[Route::new("default")], &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), RsErrorKind::Configuration);
    assert!(manager.calls().is_empty());
}

#[tokio::test]
async fn test_second_run_converges_with_file_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("routes.json");
    let manager = Arc::new(DryRunManager::new());
    let reconciler = Reconciler::new(manager.clone(), Arc::new(FileStore::new(&path)));
    let desired = vec![
        Route::new("10.0.0.1/24").with_device("eth0"),
        Route::new("default").with_gateway("10.0.0.254"),
    ];

    let first = reconciler
        .reconcile(&desired, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.diff.to_add.len(), 2);

    let second = reconciler
        .reconcile(&desired, &CancellationToken::new())
        .await
        .unwrap();
    assert!(second.diff.is_empty());
    assert_eq!(second.diff.unchanged.len(), 2);
    assert_eq!(manager.operations().len(), 2);

    let saved = FileStore::new(&path).load().unwrap();
    assert_eq!(saved[0].destination, "10.0.0.0/24");
}
