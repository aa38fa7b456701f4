//! Sync orchestration: the per-apartment control loop and the seams it
//! depends on (persistence store, feed source).

mod orchestrator;
mod store;

pub use orchestrator::{sync_all, ApartmentFeed, SyncOrchestrator, SyncOutcome};
pub use store::{
    FeedSource, NewAlert, NewLogEntry, SyncLogEntry, SyncLogStatus, SyncStore,
};
