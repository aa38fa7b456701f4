//! Sync alerts surfaced to the review UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    NewBooking,
    Cancellation,
    Conflict,
    SyncError,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::NewBooking => "new_booking",
            AlertKind::Cancellation => "cancellation",
            AlertKind::Conflict => "conflict",
            AlertKind::SyncError => "sync_error",
        }
    }

    pub fn parse(s: &str) -> Option<AlertKind> {
        match s {
            "new_booking" => Some(AlertKind::NewBooking),
            "cancellation" => Some(AlertKind::Cancellation),
            "conflict" => Some(AlertKind::Conflict),
            "sync_error" => Some(AlertKind::SyncError),
            _ => None,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<AlertSeverity> {
        match s {
            "info" => Some(AlertSeverity::Info),
            "warning" => Some(AlertSeverity::Warning),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification record. Immutable once created; the read/resolved
/// flags belong to the UI layer, not the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncAlert {
    pub id: i64,
    pub apartment_id: i64,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub staged_reservation_id: Option<i64>,
    pub is_read: bool,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}
