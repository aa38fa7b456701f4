//! Canonical event model.
//!
//! These types represent one external calendar entry after normalization.
//! The feed parser produces them, and the delta engine, staging workflow
//! and orchestrator work exclusively with them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which external platform a feed (and its events) came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourcePlatform {
    Airbnb,
    Booking,
    Unknown,
}

impl SourcePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourcePlatform::Airbnb => "airbnb",
            SourcePlatform::Booking => "booking",
            SourcePlatform::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<SourcePlatform> {
        match s {
            "airbnb" => Some(SourcePlatform::Airbnb),
            "booking" => Some(SourcePlatform::Booking),
            "unknown" => Some(SourcePlatform::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a feed entry means for the apartment's calendar.
///
/// Reservation and Blocked are mutually exclusive per label. Entries that
/// match neither heuristic are Ignored and dropped during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Reservation,
    Blocked,
    Ignored,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Reservation => "reservation",
            Classification::Blocked => "blocked",
            Classification::Ignored => "ignored",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One calendar entry after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Stable identifier from the feed, or a key derived from the stay
    /// dates when the feed omits one.
    pub uid: String,
    /// First night of the stay.
    pub stay_start: NaiveDate,
    /// Checkout date. Exclusive: a one-night stay ends the day after it
    /// starts.
    pub stay_end: NaiveDate,
    /// The original SUMMARY line, kept for display and re-classification.
    pub raw_label: String,
    pub classification: Classification,
    pub source_platform: SourcePlatform,
    pub guest_name_guess: Option<String>,
    pub phone_last_four_guess: Option<String>,
    pub external_reference_id: Option<String>,
    pub external_reference_url: Option<String>,
    /// The source VEVENT's properties, carried opaquely for debugging.
    pub raw_block: Option<String>,
}

impl CanonicalEvent {
    pub fn nights(&self) -> i64 {
        (self.stay_end - self.stay_start).num_days()
    }

    /// Half-open overlap test against another stay range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.stay_start < end && start < self.stay_end
    }

    /// Canonical line used for checksums. Field order and the explicit
    /// date format are fixed so the hash is stable across environments.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.uid,
            self.stay_start.format("%Y-%m-%d"),
            self.stay_end.format("%Y-%m-%d"),
            self.raw_label,
            self.classification.as_str(),
        )
    }
}

impl fmt::Display for CanonicalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} – {}] {}",
            self.uid, self.stay_start, self.stay_end, self.raw_label
        )
    }
}
