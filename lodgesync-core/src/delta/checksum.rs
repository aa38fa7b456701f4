//! Order-independent checksum over a normalized event set.

use crate::event::CanonicalEvent;

/// Hash an event set for the cheap "anything changed?" comparison.
///
/// Input ordering does not matter: events are sorted by uid before
/// hashing. The result changes exactly when the set's membership changes
/// or when any fingerprinted field (uid, stay dates, label,
/// classification) changes on any event.
pub fn checksum(events: &[CanonicalEvent]) -> String {
    let mut by_uid: Vec<&CanonicalEvent> = events.iter().collect();
    by_uid.sort_by(|a, b| a.uid.cmp(&b.uid));

    let mut hasher = blake3::Hasher::new();
    for event in by_uid {
        hasher.update(event.fingerprint().as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
