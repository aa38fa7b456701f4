//! Staged reservations: the human-in-the-loop review queue for
//! externally-observed bookings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::SourcePlatform;

/// Review lifecycle of a staged reservation.
///
/// `Pending → {Confirmed | Rejected | Duplicate}` by human review;
/// `Pending/Confirmed → Cancelled` when the source event disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagedState {
    Pending,
    Confirmed,
    Rejected,
    Duplicate,
    Cancelled,
}

impl StagedState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StagedState::Pending => "pending",
            StagedState::Confirmed => "confirmed",
            StagedState::Rejected => "rejected",
            StagedState::Duplicate => "duplicate",
            StagedState::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<StagedState> {
        match s {
            "pending" => Some(StagedState::Pending),
            "confirmed" => Some(StagedState::Confirmed),
            "rejected" => Some(StagedState::Rejected),
            "duplicate" => Some(StagedState::Duplicate),
            "cancelled" => Some(StagedState::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for StagedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation observed in an external feed, awaiting human review.
///
/// Unique per `(apartment_id, source_platform, uid)`. `last_seen_at` is
/// bumped on every sync that still observes the event; `disappeared_at`
/// is set exactly once, on the sync where it first goes missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedReservation {
    pub id: i64,
    pub apartment_id: i64,
    pub source_platform: SourcePlatform,
    pub uid: String,
    pub stay_start: NaiveDate,
    pub stay_end: NaiveDate,
    pub raw_label: String,
    pub guest_name_guess: Option<String>,
    pub phone_last_four_guess: Option<String>,
    pub external_reference_id: Option<String>,
    pub external_reference_url: Option<String>,
    pub state: StagedState,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub disappeared_at: Option<DateTime<Utc>>,
    /// Set by the review layer once promoted into the authoritative
    /// reservation store.
    pub confirmed_reservation_id: Option<i64>,
}
