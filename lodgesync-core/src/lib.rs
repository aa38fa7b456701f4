//! Core reconciliation engine for the lodgesync ecosystem.
//!
//! This crate holds everything the CLI and any future server share:
//! - `event` for the canonical event model produced by normalization
//! - `feed` for turning raw ICS feed text into canonical events
//! - `delta` for checksums, diffs, replay and conflict detection
//! - `staging` and `alert` for the human-review records
//! - `sync` for the per-apartment orchestrator and its store/fetch seams

pub mod alert;
pub mod delta;
pub mod error;
pub mod event;
pub mod feed;
pub mod staging;
pub mod sync;

// Re-export the types nearly every caller touches
pub use error::{EngineError, EngineResult};
pub use event::{CanonicalEvent, Classification, SourcePlatform};
