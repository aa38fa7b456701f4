//! End-to-end sync lifecycle against a real SQLite store.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use lodgesync_cli::db::SqliteStore;
use lodgesync_core::alert::{AlertKind, AlertSeverity};
use lodgesync_core::delta::replay;
use lodgesync_core::staging::StagedState;
use lodgesync_core::sync::{FeedSource, SyncLogStatus, SyncOrchestrator, SyncStore};
use lodgesync_core::{EngineError, EngineResult};

const APARTMENT: i64 = 1;

struct ScriptedFeed {
    responses: Mutex<VecDeque<EngineResult<String>>>,
}

impl ScriptedFeed {
    fn new(responses: Vec<EngineResult<String>>) -> Self {
        ScriptedFeed {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch(&self, _url: &str) -> EngineResult<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::Fetch("no scripted response".into())))
    }
}

async fn setup_store() -> SqliteStore {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn airbnb_feed(events: &[(&str, &str, &str, &str)]) -> String {
    let mut out = String::from(
        "BEGIN:VCALENDAR\r\nPRODID:-//Airbnb Inc//Hosting Calendar//EN\r\nVERSION:2.0\r\n",
    );
    for (uid, start, end, summary) in events {
        out.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:{}\r\nDTSTART;VALUE=DATE:{}\r\nDTEND;VALUE=DATE:{}\r\nSUMMARY:{}\r\nEND:VEVENT\r\n",
            uid, start, end, summary
        ));
    }
    out.push_str("END:VCALENDAR\r\n");
    out
}

#[tokio::test]
async fn three_sync_lifecycle() {
    let store = setup_store().await;
    let v1 = airbnb_feed(&[("r1", "20240310", "20240313", "Reserved - Jane Doe (4321)")]);
    let source = ScriptedFeed::new(vec![
        Ok(v1.clone()),
        Ok(v1), // byte-identical second fetch
        Ok(airbnb_feed(&[])),
    ]);
    let orchestrator = SyncOrchestrator::new(&store, &source);

    // Sync 1: new reservation is staged and announced
    let first = orchestrator.sync_apartment(APARTMENT, "https://feed").await;
    assert!(first.has_changes);
    assert_eq!(first.events_found, 1);

    let staged = store.pending_reservations(Some(APARTMENT)).await.unwrap();
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].state, StagedState::Pending);
    assert_eq!(staged[0].guest_name_guess.as_deref(), Some("Jane Doe"));
    assert_eq!(staged[0].phone_last_four_guess.as_deref(), Some("4321"));

    let alerts = store.alerts(false).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::NewBooking);
    assert_eq!(alerts[0].severity, AlertSeverity::Info);

    // Sync 2: unchanged feed short-circuits, nothing new is written
    let second = orchestrator.sync_apartment(APARTMENT, "https://feed").await;
    assert!(!second.has_changes);
    assert_eq!(second.checksum, first.checksum);
    assert_eq!(store.delta_history(APARTMENT).await.unwrap().len(), 1);
    assert_eq!(store.alerts(false).await.unwrap().len(), 1);

    // Promote, then sync 3: the reservation disappears from the feed
    store.promote_staged(staged[0].id, 77).await.unwrap();
    let third = orchestrator.sync_apartment(APARTMENT, "https://feed").await;
    assert!(third.has_changes);
    assert_eq!(third.events_found, 0);

    let cancelled = store
        .mark_staged_cancelled(
            APARTMENT,
            staged[0].source_platform,
            &staged[0].uid,
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    assert!(cancelled.is_none(), "row was already cancelled by the sync");

    let cancellation = store
        .alerts(false)
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.kind == AlertKind::Cancellation)
        .expect("cancellation alert for a promoted reservation");
    assert_eq!(cancellation.severity, AlertSeverity::Critical);

    // Log tells the whole story, newest first
    let statuses: Vec<SyncLogStatus> = store
        .recent_log(10)
        .await
        .unwrap()
        .iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            SyncLogStatus::Success,
            SyncLogStatus::NoChanges,
            SyncLogStatus::Success
        ]
    );

    // The persisted delta chain replays back to the current snapshot
    let history = store.delta_history(APARTMENT).await.unwrap();
    let deltas: Vec<_> = history.into_iter().map(|record| record.delta).collect();
    assert_eq!(replay(&[], &deltas), store.load_snapshot(APARTMENT).await.unwrap());
}

#[tokio::test]
async fn failed_fetch_leaves_state_untouched() {
    let store = setup_store().await;
    let v1 = airbnb_feed(&[("r1", "20240310", "20240313", "Reserved")]);
    let source = ScriptedFeed::new(vec![
        Ok(v1),
        Err(EngineError::Fetch("feed returned HTTP 503".into())),
    ]);
    let orchestrator = SyncOrchestrator::new(&store, &source);

    let first = orchestrator.sync_apartment(APARTMENT, "https://feed").await;
    let second = orchestrator.sync_apartment(APARTMENT, "https://feed").await;

    assert!(first.error.is_none());
    assert!(second.error.is_some());

    // Checksum and snapshot still reflect the last good sync
    assert_eq!(store.last_checksum(APARTMENT).await.unwrap(), first.checksum);
    assert_eq!(store.delta_history(APARTMENT).await.unwrap().len(), 1);

    let log = store.recent_log(10).await.unwrap();
    assert_eq!(log[0].status, SyncLogStatus::Error);
    assert!(store
        .alerts(false)
        .await
        .unwrap()
        .iter()
        .any(|a| a.kind == AlertKind::SyncError));
}
