//! Lectern Content Bridge
//!
//! The RPC layer connecting sandboxed lesson content to host capabilities.
//! Content code holds a [`LessonBridge`] and invokes host operations through
//! typed async calls; every call crosses the sandbox boundary as a serialized
//! message and resumes when the correlated response arrives.

pub mod client;
pub mod correlator;
pub mod error;
pub mod gate;
pub mod protocol;
pub mod transport;

pub use client::{BridgeConfig, LessonBridge};
pub use correlator::{next_request_id, Correlator};
pub use error::{BridgeError, Result};
pub use gate::{ReadinessGate, SdkState};
pub use protocol::{
    Action, EmitEventPayload, EventOutcome, HistoryPayload, HostMessage, InstanceDataRecord,
    MediaPlaying, MediaPosition, PostToChatPayload, ProgressSnapshot, PublicProfile, RawRequest,
    ReadyNotice, RequestEnvelope, ResponseEnvelope, ResultSummary, SaveInstanceDataPayload,
    SaveProgressOutcome, SaveProgressPayload, SeekMediaPayload, SetVolumePayload,
    ShowOverlayPayload, ShowSnackPayload, UpdateStatePayload,
};
pub use transport::{channel_pair, Endpoint, FrameReceiver, FrameSender, TransportError};
