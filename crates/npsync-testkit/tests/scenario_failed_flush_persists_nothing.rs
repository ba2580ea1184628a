//! All-or-nothing at the flush boundary.
//!
//! GREEN when:
//! - a failing commit surfaces as an error from `reconcile`
//! - neither records nor grants from that run are visible
//! - a retry against the same backend applies the full run

use npsync_core::{reconcile, ReconcileRequest, RewardBundle, TargetPolicy, UserId};
use npsync_testkit::{session, MemoryBackend, MemoryCatalog};

const USER: UserId = UserId(8);

#[tokio::test]
async fn failed_commit_leaves_user_state_unchanged() {
    let catalog = MemoryCatalog::new().with_subscenarios([1, 2, 3]);
    let backend = MemoryBackend::new();
    backend.fail_next_commit();

    let req = ReconcileRequest::new(USER, TargetPolicy::MarkRead)
        .with_rewards(RewardBundle::subscenario_default());

    let err = reconcile(&catalog, &mut session(&backend), &req)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("flush"), "got: {err:#}");
    assert_eq!(backend.record_count(), 0);
    assert!(backend.grants().is_empty());
    assert_eq!(backend.wallet(USER).loveca, 0);

    let s = reconcile(&catalog, &mut session(&backend), &req)
        .await
        .unwrap();
    assert_eq!(s.newly_satisfied, 3);
    assert_eq!(backend.record_count(), 3);
    assert_eq!(backend.wallet(USER).loveca, 3);
    assert_eq!(backend.commit_count(), 1);
}

#[tokio::test]
async fn catalog_failure_aborts_before_any_staging() {
    let catalog = MemoryCatalog::new().with_failing_listing();
    let backend = MemoryBackend::new();

    let res = reconcile(
        &catalog,
        &mut session(&backend),
        &ReconcileRequest::new(USER, TargetPolicy::MarkRead),
    )
    .await;

    assert!(res.is_err());
    assert_eq!(backend.commit_count(), 0);
}
