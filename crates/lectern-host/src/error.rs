//! Error types for the host side of the bridge.
//!
//! Handler failures never cross the sandbox boundary as panics: the router
//! renders them into the `error` slot of the correlated response. The
//! variants here exist so handlers and seams can speak in types before that
//! flattening happens.

/// A specialized `Result` type for host-side operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors that can occur while serving capability calls.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The frame carried a verb outside the protocol, or a payload that
    /// does not match its verb.
    #[error("unrecognized action: {verb}")]
    UnrecognizedAction {
        /// The verb as received.
        verb: String,
    },

    /// An event demanded an asynchronous reply but no responder is wired.
    #[error("event responder unavailable: {message}")]
    Responder {
        /// Why no reply can be produced.
        message: String,
    },

    /// The media controller rejected a command or query.
    #[error("media controller failure: {message}")]
    Media {
        /// Controller-provided description.
        message: String,
    },

    /// The profile directory could not produce a profile.
    #[error("profile lookup failed: {message}")]
    Profile {
        /// Directory-provided description.
        message: String,
    },

    /// The scoring pipeline rejected or lost a forwarded result.
    #[error("results pipeline failure: {message}")]
    Results {
        /// Pipeline-provided description.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HostError {
    /// Creates an `UnrecognizedAction` error.
    #[must_use]
    pub fn unrecognized(verb: impl Into<String>) -> Self {
        Self::UnrecognizedAction { verb: verb.into() }
    }

    /// Creates a `Responder` error.
    #[must_use]
    pub fn responder(message: impl Into<String>) -> Self {
        Self::Responder {
            message: message.into(),
        }
    }

    /// Creates a `Media` error.
    #[must_use]
    pub fn media(message: impl Into<String>) -> Self {
        Self::Media {
            message: message.into(),
        }
    }

    /// Creates a `Profile` error.
    #[must_use]
    pub fn profile(message: impl Into<String>) -> Self {
        Self::Profile {
            message: message.into(),
        }
    }

    /// Creates a `Results` error.
    #[must_use]
    pub fn results(message: impl Into<String>) -> Self {
        Self::Results {
            message: message.into(),
        }
    }
}
