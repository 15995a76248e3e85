//! Lectern Results & Averaging
//!
//! Receives finalized interaction scores, appends immutable result records,
//! and maintains per-placement running averages with an O(1) incremental
//! update. Exposes the `/interaction-results` REST surface consumed by the
//! bridge's persistence capability.

pub mod api;
pub mod average;
pub mod service;

pub use api::{create_router, AppState, AverageResponse, ErrorResponse, SaveResultRequest};
pub use average::{percentile_below, round2, sanitize_score, IncrementalAverage};
pub use service::{
    AverageSnapshot, InteractionKey, InteractionResult, ResultDraft, ResultOutcome, ResultsService,
};

/// Errors raised by the results service.
#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    /// A required key component was empty.
    #[error("invalid interaction key: {field} must not be empty")]
    InvalidKey {
        /// Which component was empty.
        field: &'static str,
    },
}

impl ResultsError {
    /// Creates an `InvalidKey` error for `field`.
    #[must_use]
    pub const fn invalid_key(field: &'static str) -> Self {
        Self::InvalidKey { field }
    }
}

/// A specialized `Result` type for results-service operations.
pub type Result<T> = std::result::Result<T, ResultsError>;
