//! Auxiliary bound lookup failures.
//!
//! GREEN when:
//! - a missing rarity row skips that entity, counts it as `unresolved`,
//!   keeps it out of `total`, and the run still completes
//! - a rarity lookup *error* aborts the run before the flush, persisting nothing

use npsync_core::{reconcile, EntityKind, ReconcileRequest, TargetPolicy, UserId};
use npsync_testkit::{rarity, session, MemoryBackend, MemoryCatalog};

const USER: UserId = UserId(55);

#[tokio::test]
async fn missing_rarity_row_is_skipped_and_counted_apart() {
    let catalog = MemoryCatalog::new()
        .with_unit(1, 2, 0)
        .with_unit(2, 9, 0) // no rarity row for 9
        .with_unit(3, 2, 0)
        .with_rarity(rarity(2, 200));
    let backend = MemoryBackend::new();

    let s = reconcile(
        &catalog,
        &mut session(&backend),
        &ReconcileRequest::new(USER, TargetPolicy::MaxUnlock),
    )
    .await
    .unwrap();

    assert_eq!(s.total, 2);
    assert_eq!(s.unresolved, 1);
    assert_eq!(s.newly_satisfied + s.already_satisfied, s.total);
    assert_eq!(s.visited(), 3);
    assert!(backend.record(USER, EntityKind::Unit, 2).is_none());
    assert_eq!(backend.record_count(), 2);
}

#[tokio::test]
async fn rarity_lookup_error_aborts_without_persisting() {
    let catalog = MemoryCatalog::new()
        .with_unit(1, 2, 0)
        .with_unit(2, 3, 0)
        .with_rarity(rarity(2, 200))
        .with_failing_rarity(3);
    let backend = MemoryBackend::new();

    let err = reconcile(
        &catalog,
        &mut session(&backend),
        &ReconcileRequest::new(USER, TargetPolicy::MaxUnlock),
    )
    .await
    .unwrap_err();

    assert!(format!("{err:#}").contains("rarity"), "got: {err:#}");
    assert_eq!(backend.record_count(), 0, "unit 1 was staged but never flushed");
    assert_eq!(backend.commit_count(), 0);
}
