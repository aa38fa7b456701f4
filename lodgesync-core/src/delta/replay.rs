//! Rebuild an event set from a baseline plus an ordered delta chain.
//!
//! Persisting only the first full snapshot and a chain of deltas keeps
//! storage proportional to change, at the cost of replay time
//! proportional to chain length.

use std::collections::HashMap;

use crate::delta::SyncDelta;
use crate::event::CanonicalEvent;

/// Apply each delta's removed/added/modified in chronological order
/// against a working map keyed by uid.
pub fn replay(base: &[CanonicalEvent], deltas: &[SyncDelta]) -> Vec<CanonicalEvent> {
    let mut state: HashMap<String, CanonicalEvent> = base
        .iter()
        .map(|e| (e.uid.clone(), e.clone()))
        .collect();

    for delta in deltas {
        for event in &delta.removed {
            state.remove(&event.uid);
        }
        for event in &delta.added {
            state.insert(event.uid.clone(), event.clone());
        }
        for change in &delta.modified {
            state.insert(change.uid.clone(), change.after.clone());
        }
    }

    let mut events: Vec<CanonicalEvent> = state.into_values().collect();
    events.sort_by(|a, b| {
        a.stay_start
            .cmp(&b.stay_start)
            .then_with(|| a.uid.cmp(&b.uid))
    });
    events
}
