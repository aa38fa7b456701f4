//! Diff computation between two normalized event sets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::{CanonicalEvent, Classification};

/// An event present in both sets whose tracked fields differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifiedEvent {
    pub uid: String,
    pub before: CanonicalEvent,
    pub after: CanonicalEvent,
    /// One human-readable line per changed field, e.g.
    /// `stay_end: 2024-03-12 → 2024-03-13`.
    pub changes: Vec<String>,
}

/// Minimal description of what changed between two observations of a feed.
///
/// A uid appears in at most one of added/removed/modified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncDelta {
    pub added: Vec<CanonicalEvent>,
    pub removed: Vec<CanonicalEvent>,
    pub modified: Vec<ModifiedEvent>,
}

impl SyncDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.added.len(), self.removed.len(), self.modified.len())
    }
}

/// Compare the current event set against the previous one.
///
/// Runs in O(n) over uid-keyed maps.
pub fn diff(current: &[CanonicalEvent], previous: &[CanonicalEvent]) -> SyncDelta {
    let previous_by_uid: HashMap<&str, &CanonicalEvent> =
        previous.iter().map(|e| (e.uid.as_str(), e)).collect();
    let current_by_uid: HashMap<&str, &CanonicalEvent> =
        current.iter().map(|e| (e.uid.as_str(), e)).collect();

    let mut delta = SyncDelta::default();

    for event in current {
        match previous_by_uid.get(event.uid.as_str()) {
            None => delta.added.push(event.clone()),
            Some(before) => {
                let changes = field_changes(before, event);
                if !changes.is_empty() {
                    delta.modified.push(ModifiedEvent {
                        uid: event.uid.clone(),
                        before: (*before).clone(),
                        after: event.clone(),
                        changes,
                    });
                }
            }
        }
    }

    for event in previous {
        if !current_by_uid.contains_key(event.uid.as_str()) {
            delta.removed.push(event.clone());
        }
    }

    delta
}

fn field_changes(before: &CanonicalEvent, after: &CanonicalEvent) -> Vec<String> {
    let mut changes = Vec::new();

    if before.stay_start != after.stay_start {
        changes.push(format!(
            "stay_start: {} → {}",
            before.stay_start, after.stay_start
        ));
    }
    if before.stay_end != after.stay_end {
        changes.push(format!("stay_end: {} → {}", before.stay_end, after.stay_end));
    }
    if before.raw_label != after.raw_label {
        changes.push(format!(
            "raw_label: {} → {}",
            before.raw_label, after.raw_label
        ));
    }
    if before.classification != after.classification {
        changes.push(format!(
            "classification: {} → {}",
            before.classification, after.classification
        ));
    }
    if before.phone_last_four_guess != after.phone_last_four_guess {
        changes.push(format!(
            "phone_last_four: {} → {}",
            before.phone_last_four_guess.as_deref().unwrap_or("-"),
            after.phone_last_four_guess.as_deref().unwrap_or("-"),
        ));
    }

    changes
}

/// Removed reservations are cancellations. A disappearing Blocked entry is
/// routine housekeeping and never alerts.
pub fn detect_cancellations(delta: &SyncDelta) -> Vec<CanonicalEvent> {
    delta
        .removed
        .iter()
        .filter(|e| e.classification == Classification::Reservation)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::replay;
    use crate::event::SourcePlatform;

    fn event(uid: &str, start: &str, end: &str, classification: Classification) -> CanonicalEvent {
        CanonicalEvent {
            uid: uid.into(),
            stay_start: start.parse().unwrap(),
            stay_end: end.parse().unwrap(),
            raw_label: match classification {
                Classification::Reservation => "Reserved".into(),
                _ => "Airbnb (Not available)".into(),
            },
            classification,
            source_platform: SourcePlatform::Airbnb,
            guest_name_guess: None,
            phone_last_four_guess: None,
            external_reference_id: None,
            external_reference_url: None,
            raw_block: None,
        }
    }

    #[test]
    fn added_removed_modified_are_disjoint() {
        let previous = vec![
            event("keep", "2024-03-10", "2024-03-12", Classification::Reservation),
            event("gone", "2024-04-01", "2024-04-03", Classification::Reservation),
            event("moved", "2024-05-01", "2024-05-04", Classification::Reservation),
        ];
        let mut moved = event("moved", "2024-05-02", "2024-05-05", Classification::Reservation);
        moved.raw_label = "Reserved - Jane".into();
        let current = vec![
            event("keep", "2024-03-10", "2024-03-12", Classification::Reservation),
            event("new", "2024-06-01", "2024-06-02", Classification::Reservation),
            moved,
        ];

        let delta = diff(&current, &previous);

        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.added[0].uid, "new");
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed[0].uid, "gone");
        assert_eq!(delta.modified.len(), 1);

        let change = &delta.modified[0];
        assert_eq!(change.uid, "moved");
        assert!(change
            .changes
            .iter()
            .any(|c| c == "stay_start: 2024-05-01 → 2024-05-02"));
        assert!(change
            .changes
            .iter()
            .any(|c| c == "stay_end: 2024-05-04 → 2024-05-05"));
        assert!(change.changes.iter().any(|c| c.starts_with("raw_label:")));
    }

    #[test]
    fn identical_sets_produce_empty_delta() {
        let events = vec![event("a", "2024-03-10", "2024-03-12", Classification::Reservation)];
        assert!(diff(&events, &events).is_empty());
    }

    #[test]
    fn delta_applied_to_previous_reconstructs_current() {
        let previous = vec![
            event("a", "2024-03-10", "2024-03-12", Classification::Reservation),
            event("b", "2024-04-01", "2024-04-03", Classification::Blocked),
        ];
        let current = vec![
            event("a", "2024-03-10", "2024-03-13", Classification::Reservation),
            event("c", "2024-05-01", "2024-05-02", Classification::Reservation),
        ];

        let delta = diff(&current, &previous);
        let rebuilt = replay(&previous, &[delta]);

        let mut expected = current.clone();
        expected.sort_by(|a, b| a.stay_start.cmp(&b.stay_start).then_with(|| a.uid.cmp(&b.uid)));
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn blocked_removal_is_not_a_cancellation() {
        let previous = vec![
            event("r1", "2024-03-10", "2024-03-12", Classification::Reservation),
            event("b1", "2024-04-01", "2024-04-03", Classification::Blocked),
        ];
        let delta = diff(&[], &previous);

        assert_eq!(delta.removed.len(), 2);
        let cancellations = detect_cancellations(&delta);
        assert_eq!(cancellations.len(), 1);
        assert_eq!(cancellations[0].uid, "r1");
    }
}
