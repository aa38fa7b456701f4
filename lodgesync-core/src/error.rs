//! Error types for the lodgesync ecosystem.

use thiserror::Error;

/// Errors that can occur while syncing an apartment's external calendar.
///
/// Only fetch and store failures exist here on purpose: malformed or
/// unclassifiable feed events are dropped during normalization, never
/// raised.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Feed fetch failed: {0}")]
    Fetch(String),

    #[error("Feed fetch timed out after {0}s")]
    FetchTimeout(u64),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
