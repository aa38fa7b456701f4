//! Store and fetch contracts for the orchestrator.
//!
//! The engine only needs key-value and append semantics from its store.
//! Production uses SQLite; tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::alert::{AlertKind, AlertSeverity};
use crate::delta::{ConfirmedStay, SyncDelta};
use crate::error::EngineResult;
use crate::event::{CanonicalEvent, SourcePlatform};
use crate::staging::StagedReservation;

/// Status of one sync-log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncLogStatus {
    Success,
    NoChanges,
    Error,
}

impl SyncLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncLogStatus::Success => "success",
            SyncLogStatus::NoChanges => "no_changes",
            SyncLogStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<SyncLogStatus> {
        match s {
            "success" => Some(SyncLogStatus::Success),
            "no_changes" => Some(SyncLogStatus::NoChanges),
            "error" => Some(SyncLogStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for SyncLogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for an alert append. The store assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub apartment_id: i64,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub staged_reservation_id: Option<i64>,
}

/// Input for a sync-log append.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub apartment_id: i64,
    pub status: SyncLogStatus,
    pub message: String,
    pub events_found: i64,
    pub added_count: i64,
    pub removed_count: i64,
    pub modified_count: i64,
}

impl NewLogEntry {
    pub fn error(apartment_id: i64, message: String) -> Self {
        NewLogEntry {
            apartment_id,
            status: SyncLogStatus::Error,
            message,
            events_found: 0,
            added_count: 0,
            removed_count: 0,
            modified_count: 0,
        }
    }

    pub fn no_changes(apartment_id: i64, events_found: i64) -> Self {
        NewLogEntry {
            apartment_id,
            status: SyncLogStatus::NoChanges,
            message: format!("feed unchanged ({} events)", events_found),
            events_found,
            added_count: 0,
            removed_count: 0,
            modified_count: 0,
        }
    }
}

/// A sync-log record read back from the store.
#[derive(Debug, Clone)]
pub struct SyncLogEntry {
    pub id: i64,
    pub apartment_id: i64,
    pub status: SyncLogStatus,
    pub message: String,
    pub events_found: i64,
    pub added_count: i64,
    pub removed_count: i64,
    pub modified_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Persistence contract for the reconciliation engine.
///
/// The orchestrator is the sole writer for a given apartment; different
/// apartments share no mutable state.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Checksum stored by the last reconciling sync, if any.
    async fn last_checksum(&self, apartment_id: i64) -> EngineResult<Option<String>>;

    /// Baseline snapshot written by the last reconciling sync. Empty when
    /// the apartment has never reconciled.
    async fn load_snapshot(&self, apartment_id: i64) -> EngineResult<Vec<CanonicalEvent>>;

    /// Durably record the outcome of one reconciliation. Delta record,
    /// new checksum and refreshed snapshot must land together: a reader
    /// must never observe the checksum without its delta.
    async fn record_reconciliation(
        &self,
        apartment_id: i64,
        checksum: &str,
        delta: &SyncDelta,
        snapshot: &[CanonicalEvent],
    ) -> EngineResult<()>;

    /// Upsert a staged reservation keyed by
    /// `(apartment_id, event.source_platform, event.uid)`, bumping
    /// `last_seen_at`. A row previously cancelled is resurrected to
    /// pending when its event reappears.
    async fn upsert_staged(
        &self,
        apartment_id: i64,
        event: &CanonicalEvent,
        seen_at: DateTime<Utc>,
    ) -> EngineResult<()>;

    /// Mark a staged reservation gone from the feed: state becomes
    /// cancelled and `disappeared_at` is set if not already. Only pending
    /// and confirmed rows transition; returns the updated row when one
    /// matched.
    async fn mark_staged_cancelled(
        &self,
        apartment_id: i64,
        platform: SourcePlatform,
        uid: &str,
        disappeared_at: DateTime<Utc>,
    ) -> EngineResult<Option<StagedReservation>>;

    /// Confirmed bookings for conflict detection.
    async fn confirmed_stays(&self, apartment_id: i64) -> EngineResult<Vec<ConfirmedStay>>;

    async fn append_alert(&self, alert: NewAlert) -> EngineResult<()>;

    async fn append_log(&self, entry: NewLogEntry) -> EngineResult<()>;
}

/// Fetches the raw feed text for an apartment's configured URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> EngineResult<String>;
}
