//! Error types for the content-side bridge.
//!
//! Every failure mode of a capability call is represented here. Errors are
//! values returned to the caller; nothing is ever thrown across the sandbox
//! boundary.

use crate::gate::SdkState;
use crate::transport::TransportError;

/// A specialized `Result` type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur on the content side of the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The underlying message channel failed or was torn down.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The host recognized the call but the handler reported a failure.
    ///
    /// Carries the `error` field of the correlated response verbatim.
    #[error("capability call failed: {message}")]
    Capability {
        /// Host-provided failure description.
        message: String,
    },

    /// A host frame or result payload did not match the expected shape.
    #[error("protocol violation: {message}")]
    Protocol {
        /// Description of the malformed data.
        message: String,
    },

    /// The host never signaled readiness within the configured window.
    #[error("bridge not ready after {waited_ms}ms\n\nSuggestion: verify the host attached a capability router to this channel")]
    NotReady {
        /// How long the caller waited, in milliseconds.
        waited_ms: u64,
    },

    /// An attempt was made to move the readiness state machine backwards.
    #[error("invalid readiness transition: cannot go from {from} to {to}")]
    StateRegression {
        /// The current state.
        from: SdkState,
        /// The attempted target state.
        to: SdkState,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Creates a `Capability` error from a host-provided message.
    #[must_use]
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability {
            message: message.into(),
        }
    }

    /// Creates a `Protocol` error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a `NotReady` error after waiting `waited_ms` milliseconds.
    #[must_use]
    pub const fn not_ready(waited_ms: u64) -> Self {
        Self::NotReady { waited_ms }
    }

    /// Creates a `StateRegression` error.
    #[must_use]
    pub const fn state_regression(from: SdkState, to: SdkState) -> Self {
        Self::StateRegression { from, to }
    }

    /// Returns `true` if retrying the call on a fresh bridge instance could
    /// succeed.
    ///
    /// Transport teardown and readiness timeouts are recoverable by
    /// re-acquiring the bridge; capability and protocol failures are not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::NotReady { .. })
    }
}
