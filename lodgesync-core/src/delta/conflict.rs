//! Double-booking detection against confirmed reservations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::{CanonicalEvent, Classification};

/// A confirmed booking from the authoritative store, reduced to what the
/// overlap test needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedStay {
    pub reservation_id: i64,
    pub stay_start: NaiveDate,
    /// Exclusive, like `CanonicalEvent::stay_end`.
    pub stay_end: NaiveDate,
}

/// An incoming reservation that overlaps one or more confirmed bookings.
#[derive(Debug, Clone)]
pub struct BookingConflict {
    pub event: CanonicalEvent,
    pub conflicting_ids: Vec<i64>,
}

/// Flag incoming reservations whose half-open stay range overlaps an
/// existing confirmed booking. Abutting ranges (checkout day equals
/// check-in day) do not overlap. Blocked events are never flagged.
pub fn detect_conflicts(
    new_events: &[CanonicalEvent],
    existing: &[ConfirmedStay],
) -> Vec<BookingConflict> {
    new_events
        .iter()
        .filter(|e| e.classification == Classification::Reservation)
        .filter_map(|event| {
            let conflicting_ids: Vec<i64> = existing
                .iter()
                .filter(|stay| event.overlaps(stay.stay_start, stay.stay_end))
                .map(|stay| stay.reservation_id)
                .collect();

            if conflicting_ids.is_empty() {
                None
            } else {
                Some(BookingConflict {
                    event: event.clone(),
                    conflicting_ids,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SourcePlatform;

    fn event(uid: &str, start: &str, end: &str, classification: Classification) -> CanonicalEvent {
        CanonicalEvent {
            uid: uid.into(),
            stay_start: start.parse().unwrap(),
            stay_end: end.parse().unwrap(),
            raw_label: "Reserved".into(),
            classification,
            source_platform: SourcePlatform::Airbnb,
            guest_name_guess: None,
            phone_last_four_guess: None,
            external_reference_id: None,
            external_reference_url: None,
            raw_block: None,
        }
    }

    fn confirmed(id: i64, start: &str, end: &str) -> ConfirmedStay {
        ConfirmedStay {
            reservation_id: id,
            stay_start: start.parse().unwrap(),
            stay_end: end.parse().unwrap(),
        }
    }

    #[test]
    fn overlapping_ranges_conflict() {
        let existing = vec![confirmed(7, "2024-03-10", "2024-03-13")];
        let incoming = vec![event("n1", "2024-03-12", "2024-03-15", Classification::Reservation)];

        let conflicts = detect_conflicts(&incoming, &existing);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflicting_ids, vec![7]);
    }

    #[test]
    fn abutting_ranges_do_not_conflict() {
        let existing = vec![confirmed(7, "2024-03-10", "2024-03-13")];
        let incoming = vec![event("n1", "2024-03-13", "2024-03-15", Classification::Reservation)];

        assert!(detect_conflicts(&incoming, &existing).is_empty());
    }

    #[test]
    fn blocked_events_are_never_flagged() {
        let existing = vec![confirmed(7, "2024-03-10", "2024-03-13")];
        let incoming = vec![event("b1", "2024-03-11", "2024-03-14", Classification::Blocked)];

        assert!(detect_conflicts(&incoming, &existing).is_empty());
    }

    #[test]
    fn all_overlapping_confirmed_ids_are_reported() {
        let existing = vec![
            confirmed(1, "2024-03-10", "2024-03-12"),
            confirmed(2, "2024-03-13", "2024-03-16"),
            confirmed(3, "2024-03-20", "2024-03-22"),
        ];
        let incoming = vec![event("n1", "2024-03-11", "2024-03-14", Classification::Reservation)];

        let conflicts = detect_conflicts(&incoming, &existing);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflicting_ids, vec![1, 2]);
    }
}
