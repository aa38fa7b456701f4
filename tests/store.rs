//! SQLite store behavior against an in-memory database.

use chrono::{Duration, Utc};

use lodgesync_cli::db::SqliteStore;
use lodgesync_core::delta::diff;
use lodgesync_core::staging::StagedState;
use lodgesync_core::sync::{NewAlert, NewLogEntry, SyncLogStatus, SyncStore};
use lodgesync_core::{CanonicalEvent, Classification, SourcePlatform};
use lodgesync_core::alert::{AlertKind, AlertSeverity};

async fn setup_store() -> SqliteStore {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn event(uid: &str, start: &str, end: &str, label: &str) -> CanonicalEvent {
    CanonicalEvent {
        uid: uid.into(),
        stay_start: start.parse().unwrap(),
        stay_end: end.parse().unwrap(),
        raw_label: label.into(),
        classification: Classification::Reservation,
        source_platform: SourcePlatform::Airbnb,
        guest_name_guess: None,
        phone_last_four_guess: None,
        external_reference_id: None,
        external_reference_url: None,
        raw_block: None,
    }
}

#[tokio::test]
async fn upsert_updates_in_place_on_natural_key() {
    let store = setup_store().await;
    let first_seen = Utc::now();

    let mut reservation = event("r1", "2024-03-10", "2024-03-13", "Reserved");
    store.upsert_staged(1, &reservation, first_seen).await.unwrap();

    reservation.raw_label = "Reserved - Jane Doe".into();
    store
        .upsert_staged(1, &reservation, first_seen + Duration::minutes(5))
        .await
        .unwrap();

    let rows = store.pending_reservations(Some(1)).await.unwrap();
    assert_eq!(rows.len(), 1, "same natural key must not duplicate");
    assert_eq!(rows[0].raw_label, "Reserved - Jane Doe");
    assert!(rows[0].last_seen_at > rows[0].first_seen_at);
}

#[tokio::test]
async fn same_uid_on_other_platform_or_apartment_is_distinct() {
    let store = setup_store().await;
    let now = Utc::now();

    let airbnb = event("shared", "2024-03-10", "2024-03-13", "Reserved");
    let mut booking = airbnb.clone();
    booking.source_platform = SourcePlatform::Booking;

    store.upsert_staged(1, &airbnb, now).await.unwrap();
    store.upsert_staged(1, &booking, now).await.unwrap();
    store.upsert_staged(2, &airbnb, now).await.unwrap();

    assert_eq!(store.pending_reservations(None).await.unwrap().len(), 3);
    assert_eq!(store.pending_reservations(Some(1)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn cancellation_sets_disappeared_at_once() {
    let store = setup_store().await;
    let now = Utc::now();
    store
        .upsert_staged(1, &event("r1", "2024-03-10", "2024-03-13", "Reserved"), now)
        .await
        .unwrap();

    let gone_at = now + Duration::hours(1);
    let row = store
        .mark_staged_cancelled(1, SourcePlatform::Airbnb, "r1", gone_at)
        .await
        .unwrap()
        .expect("row should transition");
    assert_eq!(row.state, StagedState::Cancelled);
    assert!(row.disappeared_at.is_some());

    // Already cancelled: no second transition, no second timestamp
    let again = store
        .mark_staged_cancelled(1, SourcePlatform::Airbnb, "r1", gone_at + Duration::hours(1))
        .await
        .unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn reappearing_event_resurrects_cancelled_row() {
    let store = setup_store().await;
    let now = Utc::now();
    let reservation = event("r1", "2024-03-10", "2024-03-13", "Reserved");

    store.upsert_staged(1, &reservation, now).await.unwrap();
    store
        .mark_staged_cancelled(1, SourcePlatform::Airbnb, "r1", now)
        .await
        .unwrap();
    store
        .upsert_staged(1, &reservation, now + Duration::days(1))
        .await
        .unwrap();

    let rows = store.pending_reservations(Some(1)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].state, StagedState::Pending);
    assert!(rows[0].disappeared_at.is_none());
}

#[tokio::test]
async fn promoted_rows_back_conflict_detection() {
    let store = setup_store().await;
    let now = Utc::now();
    store
        .upsert_staged(1, &event("r1", "2024-03-10", "2024-03-13", "Reserved"), now)
        .await
        .unwrap();
    store
        .upsert_staged(1, &event("r2", "2024-04-01", "2024-04-03", "Reserved"), now)
        .await
        .unwrap();

    // Only r1 gets promoted
    let staged_id = store.pending_reservations(Some(1)).await.unwrap()[0].id;
    store.promote_staged(staged_id, 42).await.unwrap();

    let stays = store.confirmed_stays(1).await.unwrap();
    assert_eq!(stays.len(), 1);
    assert_eq!(stays[0].reservation_id, 42);
    assert_eq!(stays[0].stay_start, "2024-03-10".parse().unwrap());
}

#[tokio::test]
async fn reconciliation_persists_checksum_delta_and_snapshot_together() {
    let store = setup_store().await;
    let current = vec![event("r1", "2024-03-10", "2024-03-13", "Reserved")];
    let delta = diff(&current, &[]);

    store
        .record_reconciliation(1, "abc123", &delta, &current)
        .await
        .unwrap();

    assert_eq!(store.last_checksum(1).await.unwrap().as_deref(), Some("abc123"));
    assert_eq!(store.load_snapshot(1).await.unwrap(), current);

    let history = store.delta_history(1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].checksum, "abc123");
    assert_eq!(history[0].delta.added.len(), 1);

    // A second reconciliation replaces state but appends to history
    store
        .record_reconciliation(1, "def456", &diff(&[], &current), &[])
        .await
        .unwrap();
    assert_eq!(store.last_checksum(1).await.unwrap().as_deref(), Some("def456"));
    assert!(store.load_snapshot(1).await.unwrap().is_empty());
    assert_eq!(store.delta_history(1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn checksum_is_scoped_per_apartment() {
    let store = setup_store().await;
    let events = vec![event("r1", "2024-03-10", "2024-03-13", "Reserved")];
    store
        .record_reconciliation(1, "abc", &diff(&events, &[]), &events)
        .await
        .unwrap();

    assert!(store.last_checksum(2).await.unwrap().is_none());
    assert!(store.load_snapshot(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn alerts_and_log_round_trip() {
    let store = setup_store().await;

    store
        .append_alert(NewAlert {
            apartment_id: 1,
            kind: AlertKind::NewBooking,
            severity: AlertSeverity::Info,
            message: "1 new external reservation(s) staged for review".into(),
            staged_reservation_id: None,
        })
        .await
        .unwrap();
    store
        .append_log(NewLogEntry {
            apartment_id: 1,
            status: SyncLogStatus::Success,
            message: "reconciled feed: 1 added, 0 removed, 0 modified".into(),
            events_found: 1,
            added_count: 1,
            removed_count: 0,
            modified_count: 0,
        })
        .await
        .unwrap();

    let alerts = store.alerts(true).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::NewBooking);
    assert!(!alerts[0].is_read);
    assert!(!alerts[0].is_resolved);

    let log = store.recent_log(10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, SyncLogStatus::Success);
    assert_eq!(log[0].added_count, 1);
}
