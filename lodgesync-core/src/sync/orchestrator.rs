//! Per-apartment sync control loop.
//!
//! One run walks `Fetching → Comparing → (NoOp | Reconciling) → Done`
//! or ends in `Failed`. Only fetch failures and delta/checksum
//! persistence failures fail a run; everything else degrades into log
//! entries and skipped events.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::alert::{AlertKind, AlertSeverity};
use crate::delta::{checksum, detect_cancellations, detect_conflicts, diff, SyncDelta};
use crate::error::EngineResult;
use crate::event::{CanonicalEvent, Classification};
use crate::feed::normalize;
use crate::sync::store::{FeedSource, NewAlert, NewLogEntry, SyncLogStatus, SyncStore};

/// An apartment's feed subscription, as configured.
#[derive(Debug, Clone)]
pub struct ApartmentFeed {
    pub apartment_id: i64,
    pub feed_url: String,
}

/// Summary of one apartment sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub apartment_id: i64,
    pub has_changes: bool,
    pub checksum: Option<String>,
    pub events_found: usize,
    /// Present only when the run reconciled.
    pub delta: Option<SyncDelta>,
    pub error: Option<String>,
}

pub struct SyncOrchestrator<'a> {
    store: &'a dyn SyncStore,
    source: &'a dyn FeedSource,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(store: &'a dyn SyncStore, source: &'a dyn FeedSource) -> Self {
        SyncOrchestrator { store, source }
    }

    /// Run one sync for one apartment. Never panics or propagates:
    /// failures come back in `SyncOutcome::error` after being logged.
    pub async fn sync_apartment(&self, apartment_id: i64, feed_url: &str) -> SyncOutcome {
        match self.try_sync(apartment_id, feed_url).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = err.to_string();
                warn!(apartment_id, error = %message, "sync failed");
                self.log_quietly(NewLogEntry::error(apartment_id, message.clone()))
                    .await;
                self.alert_quietly(NewAlert {
                    apartment_id,
                    kind: AlertKind::SyncError,
                    severity: AlertSeverity::Critical,
                    message: message.clone(),
                    staged_reservation_id: None,
                })
                .await;
                SyncOutcome {
                    apartment_id,
                    has_changes: false,
                    checksum: None,
                    events_found: 0,
                    delta: None,
                    error: Some(message),
                }
            }
        }
    }

    async fn try_sync(&self, apartment_id: i64, feed_url: &str) -> EngineResult<SyncOutcome> {
        // Fetching
        let raw = self.source.fetch(feed_url).await?;

        // Comparing
        let events = normalize(&raw);
        let current_checksum = checksum(&events);
        let last = self.store.last_checksum(apartment_id).await?;

        if last.as_deref() == Some(current_checksum.as_str()) {
            info!(apartment_id, events = events.len(), "feed unchanged");
            self.log_quietly(NewLogEntry::no_changes(apartment_id, events.len() as i64))
                .await;
            return Ok(SyncOutcome {
                apartment_id,
                has_changes: false,
                checksum: Some(current_checksum),
                events_found: events.len(),
                delta: None,
                error: None,
            });
        }

        // Reconciling: previous state is the snapshot of the last
        // reconciling sync, so Blocked events diff like everything else
        let previous = self.store.load_snapshot(apartment_id).await?;
        let delta = diff(&events, &previous);

        // Checksum, delta and snapshot land together, strictly before any
        // staging mutation. A crash here leaves a delta without staging
        // updates, which a later run can detect, not a lost update.
        self.store
            .record_reconciliation(apartment_id, &current_checksum, &delta, &events)
            .await?;

        let now = Utc::now();

        // Stage every reservation the feed still carries, so last_seen_at
        // is bumped for unchanged events too; one bad row never aborts the
        // rest
        for event in &events {
            if event.classification != Classification::Reservation {
                continue;
            }
            if let Err(err) = self.store.upsert_staged(apartment_id, event, now).await {
                warn!(apartment_id, uid = %event.uid, error = %err, "failed to stage reservation");
            }
        }

        // Disappeared reservations become cancellations; only promoted
        // ones are worth a critical alert
        for event in detect_cancellations(&delta) {
            match self
                .store
                .mark_staged_cancelled(apartment_id, event.source_platform, &event.uid, now)
                .await
            {
                Ok(Some(staged)) => {
                    if staged.confirmed_reservation_id.is_some() {
                        self.alert_quietly(NewAlert {
                            apartment_id,
                            kind: AlertKind::Cancellation,
                            severity: AlertSeverity::Critical,
                            message: format!(
                                "Confirmed reservation '{}' ({} – {}) disappeared from the {} feed",
                                event.uid, event.stay_start, event.stay_end, event.source_platform
                            ),
                            staged_reservation_id: Some(staged.id),
                        })
                        .await;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(apartment_id, uid = %event.uid, error = %err, "failed to cancel staged reservation");
                }
            }
        }

        // Flag double-bookings introduced by the external platform
        let incoming: Vec<CanonicalEvent> = delta
            .added
            .iter()
            .chain(delta.modified.iter().map(|m| &m.after))
            .cloned()
            .collect();
        let confirmed = match self.store.confirmed_stays(apartment_id).await {
            Ok(stays) => stays,
            Err(err) => {
                warn!(apartment_id, error = %err, "failed to load confirmed stays, skipping conflict check");
                Vec::new()
            }
        };
        for conflict in detect_conflicts(&incoming, &confirmed) {
            self.alert_quietly(NewAlert {
                apartment_id,
                kind: AlertKind::Conflict,
                severity: AlertSeverity::Critical,
                message: format!(
                    "Incoming reservation '{}' ({} – {}) overlaps {} confirmed booking(s)",
                    conflict.event.uid,
                    conflict.event.stay_start,
                    conflict.event.stay_end,
                    conflict.conflicting_ids.len()
                ),
                staged_reservation_id: None,
            })
            .await;
        }

        // Summary alerts for real reservation change, never for
        // blocked-only churn
        let added_reservations = delta
            .added
            .iter()
            .filter(|e| e.classification == Classification::Reservation)
            .count();
        let modified_reservations = delta
            .modified
            .iter()
            .filter(|m| m.after.classification == Classification::Reservation)
            .count();

        if added_reservations > 0 {
            self.alert_quietly(NewAlert {
                apartment_id,
                kind: AlertKind::NewBooking,
                severity: AlertSeverity::Info,
                message: format!(
                    "{} new external reservation(s) staged for review",
                    added_reservations
                ),
                staged_reservation_id: None,
            })
            .await;
        }
        if modified_reservations > 0 {
            self.alert_quietly(NewAlert {
                apartment_id,
                kind: AlertKind::NewBooking,
                severity: AlertSeverity::Warning,
                message: format!(
                    "{} externally modified reservation(s)",
                    modified_reservations
                ),
                staged_reservation_id: None,
            })
            .await;
        }

        let (added, removed, modified) = delta.counts();
        info!(apartment_id, added, removed, modified, "feed reconciled");
        self.log_quietly(NewLogEntry {
            apartment_id,
            status: SyncLogStatus::Success,
            message: format!(
                "reconciled feed: {} added, {} removed, {} modified",
                added, removed, modified
            ),
            events_found: events.len() as i64,
            added_count: added as i64,
            removed_count: removed as i64,
            modified_count: modified as i64,
        })
        .await;

        Ok(SyncOutcome {
            apartment_id,
            has_changes: true,
            checksum: Some(current_checksum),
            events_found: events.len(),
            delta: Some(delta),
            error: None,
        })
    }

    async fn log_quietly(&self, entry: NewLogEntry) {
        if let Err(err) = self.store.append_log(entry).await {
            warn!(error = %err, "failed to append sync log entry");
        }
    }

    async fn alert_quietly(&self, alert: NewAlert) {
        if let Err(err) = self.store.append_alert(alert).await {
            warn!(error = %err, "failed to append alert");
        }
    }
}

/// Run every configured apartment in turn. Apartments are independent:
/// one failure never stops the rest. The caller (or its scheduler) is
/// responsible for not running the same apartment concurrently with
/// itself.
pub async fn sync_all(
    store: &dyn SyncStore,
    source: &dyn FeedSource,
    apartments: &[ApartmentFeed],
) -> Vec<SyncOutcome> {
    let orchestrator = SyncOrchestrator::new(store, source);
    let mut outcomes = Vec::with_capacity(apartments.len());
    for apartment in apartments {
        outcomes.push(
            orchestrator
                .sync_apartment(apartment.apartment_id, &apartment.feed_url)
                .await,
        );
    }
    outcomes
}
