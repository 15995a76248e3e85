//! Lectern Host
//!
//! The host side of the content bridge: a capability router bound to one
//! lesson session, the capability surfaces it drives (UI shell, shared
//! state, media, profiles, events), the progress/instance-data store seam,
//! and the forwarding path into the results pipeline.

pub mod capabilities;
pub mod error;
pub mod router;
pub mod scoring;
pub mod store;

pub use capabilities::{
    ChatPost, EventBroadcaster, EventResponder, InMemoryDirectory, LessonEvent, MediaController,
    ProfileDirectory, SharedLessonState, SimulatedPlayer, SnackNotice, UiState, UiSurface,
};
pub use error::{HostError, Result};
pub use router::CapabilityRouter;
pub use scoring::{ResultsSink, ScoreSubmission};
pub use store::{MemoryStore, ProgressStore, SessionContext, StoreLimits};
