//! SQLite-backed implementation of the engine's store contract, plus the
//! read queries behind the review commands.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use lodgesync_core::alert::{AlertKind, AlertSeverity, SyncAlert};
use lodgesync_core::delta::{ConfirmedStay, SyncDelta};
use lodgesync_core::staging::{StagedReservation, StagedState};
use lodgesync_core::sync::{NewAlert, NewLogEntry, SyncLogEntry, SyncLogStatus, SyncStore};
use lodgesync_core::{CanonicalEvent, EngineError, EngineResult, SourcePlatform};

use super::Pool;

pub struct SqliteStore {
    pool: Pool,
}

/// One persisted reconciliation, read back from the append-only history.
#[derive(Debug, Clone)]
pub struct DeltaRecord {
    pub id: i64,
    pub apartment_id: i64,
    pub checksum: String,
    pub delta: SyncDelta,
    pub created_at: DateTime<Utc>,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        SqliteStore { pool }
    }

    /// Staged reservations still awaiting review, oldest stay first.
    pub async fn pending_reservations(
        &self,
        apartment_id: Option<i64>,
    ) -> Result<Vec<StagedReservation>> {
        let rows = sqlx::query(
            "SELECT * FROM staged_reservations
             WHERE state = 'pending' AND (?1 IS NULL OR apartment_id = ?1)
             ORDER BY stay_start, id",
        )
        .bind(apartment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(staged_from_row).collect()
    }

    pub async fn recent_log(&self, limit: i64) -> Result<Vec<SyncLogEntry>> {
        let rows = sqlx::query("SELECT * FROM sync_log ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(log_from_row).collect()
    }

    pub async fn alerts(&self, unread_only: bool) -> Result<Vec<SyncAlert>> {
        let rows = sqlx::query(
            "SELECT * FROM sync_alerts WHERE (?1 = 0 OR is_read = 0) ORDER BY id DESC",
        )
        .bind(unread_only as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(alert_from_row).collect()
    }

    /// Reconciliation history for one apartment, oldest first.
    pub async fn delta_history(&self, apartment_id: i64) -> Result<Vec<DeltaRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM sync_deltas WHERE apartment_id = ? ORDER BY id",
        )
        .bind(apartment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let payload: String = row.try_get("payload_json")?;
                Ok(DeltaRecord {
                    id: row.try_get("id")?,
                    apartment_id: row.try_get("apartment_id")?,
                    checksum: row.try_get("checksum")?,
                    delta: serde_json::from_str(&payload)?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// Promotion write surface for the review layer: links a staged row to
    /// the authoritative reservation it became.
    pub async fn promote_staged(&self, staged_id: i64, reservation_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE staged_reservations
             SET state = 'confirmed', confirmed_reservation_id = ?
             WHERE id = ?",
        )
        .bind(reservation_id)
        .bind(staged_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SyncStore for SqliteStore {
    async fn last_checksum(&self, apartment_id: i64) -> EngineResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT checksum FROM sync_state WHERE apartment_id = ?")
            .bind(apartment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)
    }

    async fn load_snapshot(&self, apartment_id: i64) -> EngineResult<Vec<CanonicalEvent>> {
        let json: Option<String> =
            sqlx::query_scalar("SELECT snapshot_json FROM sync_state WHERE apartment_id = ?")
                .bind(apartment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        match json {
            None => Ok(Vec::new()),
            Some(json) => serde_json::from_str(&json)
                .map_err(|err| EngineError::Serialization(err.to_string())),
        }
    }

    async fn record_reconciliation(
        &self,
        apartment_id: i64,
        checksum: &str,
        delta: &SyncDelta,
        snapshot: &[CanonicalEvent],
    ) -> EngineResult<()> {
        let payload = serde_json::to_string(delta)
            .map_err(|err| EngineError::Serialization(err.to_string()))?;
        let snapshot_json = serde_json::to_string(snapshot)
            .map_err(|err| EngineError::Serialization(err.to_string()))?;
        let (added, removed, modified) = delta.counts();
        let now = Utc::now();

        // One transaction: the checksum must never be visible without its
        // delta record.
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query(
            "INSERT INTO sync_deltas
             (apartment_id, checksum, added_count, removed_count, modified_count, payload_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(apartment_id)
        .bind(checksum)
        .bind(added as i64)
        .bind(removed as i64)
        .bind(modified as i64)
        .bind(payload)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        sqlx::query(
            "INSERT INTO sync_state (apartment_id, checksum, snapshot_json, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(apartment_id) DO UPDATE SET
                 checksum = excluded.checksum,
                 snapshot_json = excluded.snapshot_json,
                 updated_at = excluded.updated_at",
        )
        .bind(apartment_id)
        .bind(checksum)
        .bind(snapshot_json)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)
    }

    async fn upsert_staged(
        &self,
        apartment_id: i64,
        event: &CanonicalEvent,
        seen_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO staged_reservations
             (apartment_id, source_platform, uid, stay_start, stay_end, raw_label,
              guest_name_guess, phone_last_four_guess, external_reference_id,
              external_reference_url, state, first_seen_at, last_seen_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
             ON CONFLICT(apartment_id, source_platform, uid) DO UPDATE SET
                 stay_start = excluded.stay_start,
                 stay_end = excluded.stay_end,
                 raw_label = excluded.raw_label,
                 guest_name_guess = excluded.guest_name_guess,
                 phone_last_four_guess = excluded.phone_last_four_guess,
                 external_reference_id = excluded.external_reference_id,
                 external_reference_url = excluded.external_reference_url,
                 last_seen_at = excluded.last_seen_at,
                 disappeared_at = CASE WHEN staged_reservations.state = 'cancelled'
                                       THEN NULL ELSE staged_reservations.disappeared_at END,
                 state = CASE WHEN staged_reservations.state = 'cancelled'
                              THEN 'pending' ELSE staged_reservations.state END",
        )
        .bind(apartment_id)
        .bind(event.source_platform.as_str())
        .bind(&event.uid)
        .bind(event.stay_start)
        .bind(event.stay_end)
        .bind(&event.raw_label)
        .bind(&event.guest_name_guess)
        .bind(&event.phone_last_four_guess)
        .bind(&event.external_reference_id)
        .bind(&event.external_reference_url)
        .bind(seen_at)
        .bind(seen_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn mark_staged_cancelled(
        &self,
        apartment_id: i64,
        platform: SourcePlatform,
        uid: &str,
        disappeared_at: DateTime<Utc>,
    ) -> EngineResult<Option<StagedReservation>> {
        let row = sqlx::query(
            "UPDATE staged_reservations
             SET state = 'cancelled', disappeared_at = COALESCE(disappeared_at, ?)
             WHERE apartment_id = ? AND source_platform = ? AND uid = ?
               AND state IN ('pending', 'confirmed')
             RETURNING *",
        )
        .bind(disappeared_at)
        .bind(apartment_id)
        .bind(platform.as_str())
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref()
            .map(staged_from_row)
            .transpose()
            .map_err(store_err)
    }

    async fn confirmed_stays(&self, apartment_id: i64) -> EngineResult<Vec<ConfirmedStay>> {
        let rows = sqlx::query(
            "SELECT confirmed_reservation_id, stay_start, stay_end
             FROM staged_reservations
             WHERE apartment_id = ? AND state = 'confirmed'
               AND confirmed_reservation_id IS NOT NULL",
        )
        .bind(apartment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter()
            .map(|row| {
                Ok(ConfirmedStay {
                    reservation_id: row.try_get("confirmed_reservation_id")?,
                    stay_start: row.try_get("stay_start")?,
                    stay_end: row.try_get("stay_end")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(store_err)
    }

    async fn append_alert(&self, alert: NewAlert) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO sync_alerts
             (apartment_id, kind, severity, message, staged_reservation_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(alert.apartment_id)
        .bind(alert.kind.as_str())
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(alert.staged_reservation_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn append_log(&self, entry: NewLogEntry) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO sync_log
             (apartment_id, status, message, events_found, added_count, removed_count, modified_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.apartment_id)
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(entry.events_found)
        .bind(entry.added_count)
        .bind(entry.removed_count)
        .bind(entry.modified_count)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

fn store_err(err: impl std::fmt::Display) -> EngineError {
    EngineError::Store(err.to_string())
}

fn staged_from_row(row: &SqliteRow) -> Result<StagedReservation> {
    let platform: String = row.try_get("source_platform")?;
    let state: String = row.try_get("state")?;

    Ok(StagedReservation {
        id: row.try_get("id")?,
        apartment_id: row.try_get("apartment_id")?,
        source_platform: SourcePlatform::parse(&platform)
            .ok_or_else(|| anyhow!("unknown source platform '{}'", platform))?,
        uid: row.try_get("uid")?,
        stay_start: row.try_get("stay_start")?,
        stay_end: row.try_get("stay_end")?,
        raw_label: row.try_get("raw_label")?,
        guest_name_guess: row.try_get("guest_name_guess")?,
        phone_last_four_guess: row.try_get("phone_last_four_guess")?,
        external_reference_id: row.try_get("external_reference_id")?,
        external_reference_url: row.try_get("external_reference_url")?,
        state: StagedState::parse(&state)
            .ok_or_else(|| anyhow!("unknown staged state '{}'", state))?,
        first_seen_at: row.try_get("first_seen_at")?,
        last_seen_at: row.try_get("last_seen_at")?,
        disappeared_at: row.try_get("disappeared_at")?,
        confirmed_reservation_id: row.try_get("confirmed_reservation_id")?,
    })
}

fn alert_from_row(row: &SqliteRow) -> Result<SyncAlert> {
    let kind: String = row.try_get("kind")?;
    let severity: String = row.try_get("severity")?;

    Ok(SyncAlert {
        id: row.try_get("id")?,
        apartment_id: row.try_get("apartment_id")?,
        kind: AlertKind::parse(&kind).ok_or_else(|| anyhow!("unknown alert kind '{}'", kind))?,
        severity: AlertSeverity::parse(&severity)
            .ok_or_else(|| anyhow!("unknown alert severity '{}'", severity))?,
        message: row.try_get("message")?,
        staged_reservation_id: row.try_get("staged_reservation_id")?,
        is_read: row.try_get("is_read")?,
        is_resolved: row.try_get("is_resolved")?,
        created_at: row.try_get("created_at")?,
    })
}

fn log_from_row(row: &SqliteRow) -> Result<SyncLogEntry> {
    let status: String = row.try_get("status")?;

    Ok(SyncLogEntry {
        id: row.try_get("id")?,
        apartment_id: row.try_get("apartment_id")?,
        status: SyncLogStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown sync status '{}'", status))?,
        message: row.try_get("message")?,
        events_found: row.try_get("events_found")?,
        added_count: row.try_get("added_count")?,
        removed_count: row.try_get("removed_count")?,
        modified_count: row.try_get("modified_count")?,
        created_at: row.try_get("created_at")?,
    })
}
