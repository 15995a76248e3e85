//! The content-side bridge handle.
//!
//! [`LessonBridge::connect`] binds one end of a transport channel, spawns
//! the inbound dispatch task, and waits (bounded) for the host's readiness
//! notice. The returned handle is an explicit context object: call sites
//! receive it at initialization instead of reaching for ambient global
//! state, and it clones cheaply for concurrent use within the sandbox.
//!
//! Every capability has a typed wrapper; all of them reduce to
//! [`LessonBridge::call`] (correlated) or [`LessonBridge::cast`]
//! (fire-and-forget).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::correlator::Correlator;
use crate::error::{BridgeError, Result};
use crate::gate::ReadinessGate;
use crate::protocol::{
    Action, EmitEventPayload, EventOutcome, HistoryPayload, HostMessage, InstanceDataRecord,
    MediaPlaying, MediaPosition, PostToChatPayload, ProgressSnapshot, PublicProfile,
    RequestEnvelope, SaveInstanceDataPayload, SaveProgressOutcome, SaveProgressPayload,
    SeekMediaPayload, SetVolumePayload, ShowOverlayPayload, ShowSnackPayload, UpdateStatePayload,
};
use crate::transport::{Endpoint, FrameReceiver, FrameSender};

/// Default wait for the host readiness notice, in milliseconds.
const DEFAULT_READY_TIMEOUT_MS: u64 = 10_000;

/// Tuning for bridge acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// How long [`LessonBridge::connect`] waits for the readiness notice
    /// before failing with [`BridgeError::NotReady`].
    pub ready_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
        }
    }
}

/// Handle through which sandboxed content invokes host capabilities.
#[derive(Debug, Clone)]
pub struct LessonBridge {
    sender: FrameSender,
    correlator: Arc<Correlator>,
    gate: Arc<ReadinessGate>,
}

impl LessonBridge {
    /// Connects the content side of a channel and waits for host readiness.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotReady`] when the host does not confirm
    /// initialization within the configured window. The caller may retry
    /// with a fresh channel; each attempt is itself bounded, which keeps
    /// re-acquisition at a bounded frequency.
    pub async fn connect(endpoint: Endpoint, config: BridgeConfig) -> Result<Self> {
        let gate = Arc::new(ReadinessGate::new());
        gate.mark_created()?;

        let (sender, receiver) = endpoint.split();
        let correlator = Arc::new(Correlator::new());
        tokio::spawn(dispatch_inbound(
            receiver,
            Arc::clone(&correlator),
            Arc::clone(&gate),
        ));

        let bridge = Self {
            sender,
            correlator,
            gate,
        };

        let wait = Duration::from_millis(config.ready_timeout_ms);
        if tokio::time::timeout(wait, bridge.gate.ready()).await.is_err() {
            return Err(BridgeError::not_ready(config.ready_timeout_ms));
        }
        debug!("bridge ready; capability calls are now safe");
        Ok(bridge)
    }

    /// Invokes a correlated capability and awaits its `(result, error)`.
    ///
    /// Fire-and-forget actions are delegated to [`Self::cast`] and resolve
    /// to `Null` immediately after the frame is handed to the transport.
    pub async fn call(&self, action: Action) -> Result<Value> {
        // Calls issued before readiness queue here instead of being dropped.
        self.gate.ready().await;

        if !action.expects_response() {
            self.cast(action)?;
            return Ok(Value::Null);
        }

        let (request_id, receiver) = self.correlator.register().await;
        let envelope = RequestEnvelope {
            action,
            request_id: Some(request_id.clone()),
        };
        let frame = serde_json::to_string(&envelope)?;
        if let Err(e) = self.sender.send(frame) {
            self.correlator.abandon(&request_id).await;
            return Err(e.into());
        }

        match receiver.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(message)) => Err(BridgeError::capability(message)),
            // The dispatch task dropped the sender: the channel is gone.
            Err(_) => Err(BridgeError::Transport(
                crate::transport::TransportError::Closed,
            )),
        }
    }

    /// Sends an action without registering a pending entry.
    pub fn cast(&self, action: Action) -> Result<()> {
        let envelope = RequestEnvelope {
            action,
            request_id: None,
        };
        let frame = serde_json::to_string(&envelope)?;
        self.sender.send(frame)?;
        Ok(())
    }

    /// Number of calls currently awaiting a host response.
    pub async fn in_flight(&self) -> usize {
        self.correlator.in_flight().await
    }

    async fn call_as<T>(&self, action: Action) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let verb = action.verb();
        let value = self.call(action).await?;
        serde_json::from_value(value)
            .map_err(|e| BridgeError::protocol(format!("unexpected {verb} result shape: {e}")))
    }

    // ------------------------------------------------------------------------
    // State capabilities
    // ------------------------------------------------------------------------

    /// Emits a named event to host observers.
    ///
    /// With `awaits_response`, the call completes only once the host's
    /// responder has produced a reply.
    pub async fn emit_event(
        &self,
        name: impl Into<String>,
        data: Value,
        awaits_response: bool,
    ) -> Result<EventOutcome> {
        self.call_as(Action::EmitEvent(EmitEventPayload {
            name: name.into(),
            data,
            awaits_response,
        }))
        .await
    }

    /// Merges a fragment into the shared lesson state.
    pub async fn update_state(&self, fragment: Value) -> Result<()> {
        self.call(Action::UpdateState(UpdateStatePayload { state: fragment }))
            .await?;
        Ok(())
    }

    /// Reads the shared lesson state.
    pub async fn state(&self) -> Result<Value> {
        self.call(Action::GetState).await
    }

    // ------------------------------------------------------------------------
    // UI capabilities
    // ------------------------------------------------------------------------

    /// Collapses the chat UI.
    pub async fn minimize_chat(&self) -> Result<()> {
        self.call(Action::MinimizeChatUi).await.map(|_| ())
    }

    /// Expands the chat UI.
    pub async fn show_chat(&self) -> Result<()> {
        self.call(Action::ShowChatUi).await.map(|_| ())
    }

    /// Enters fullscreen presentation.
    pub async fn activate_fullscreen(&self) -> Result<()> {
        self.call(Action::ActivateFullscreen).await.map(|_| ())
    }

    /// Leaves fullscreen presentation.
    pub async fn deactivate_fullscreen(&self) -> Result<()> {
        self.call(Action::DeactivateFullscreen).await.map(|_| ())
    }

    /// Appends a message to the lesson chat.
    pub async fn post_to_chat(&self, message: impl Into<String>) -> Result<()> {
        self.call(Action::PostToChat(PostToChatPayload {
            message: message.into(),
        }))
        .await
        .map(|_| ())
    }

    /// Reveals the lesson script panel.
    pub async fn show_script(&self) -> Result<()> {
        self.call(Action::ShowScript).await.map(|_| ())
    }

    /// Shows a snack notification, optionally auto-dismissed after
    /// `duration_ms`.
    pub async fn show_snack(
        &self,
        message: impl Into<String>,
        duration_ms: Option<u64>,
    ) -> Result<()> {
        self.call(Action::ShowSnack(ShowSnackPayload {
            message: message.into(),
            duration_ms,
        }))
        .await
        .map(|_| ())
    }

    /// Dismisses the snack notification.
    pub async fn hide_snack(&self) -> Result<()> {
        self.call(Action::HideSnack).await.map(|_| ())
    }

    /// Shows the HTML overlay surface.
    pub async fn show_overlay(&self, html: impl Into<String>) -> Result<()> {
        self.call(Action::ShowOverlayHtml(ShowOverlayPayload {
            html: html.into(),
        }))
        .await
        .map(|_| ())
    }

    /// Hides the HTML overlay surface.
    pub async fn hide_overlay(&self) -> Result<()> {
        self.call(Action::HideOverlayHtml).await.map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Data persistence capabilities
    // ------------------------------------------------------------------------

    /// Appends an instance-data snapshot and returns the stored record.
    pub async fn save_instance_data(&self, data: Value) -> Result<InstanceDataRecord> {
        self.call_as(Action::SaveInstanceData(SaveInstanceDataPayload { data }))
            .await
    }

    /// Reads instance-data history, newest first, bounded by `limit` (or the
    /// host default when `None`).
    pub async fn instance_history(&self, limit: Option<u32>) -> Result<Vec<InstanceDataRecord>> {
        self.call_as(Action::GetInstanceDataHistory(HistoryPayload { limit }))
            .await
    }

    /// Saves score and completion progress for the current user.
    ///
    /// A non-finite `score` crosses the wire as `null` and is persisted as 0
    /// by the host; content-side scoring bugs therefore degrade to a safe
    /// default instead of storing an invalid number.
    pub async fn save_user_progress(
        &self,
        score: f64,
        completed: bool,
        time_taken_seconds: Option<f64>,
        custom_data: Value,
    ) -> Result<SaveProgressOutcome> {
        self.call_as(Action::SaveUserProgress(SaveProgressPayload {
            score: Some(score),
            completed,
            time_taken_seconds,
            custom_data,
        }))
        .await
    }

    /// Reads the current user's progress record, if one exists.
    pub async fn user_progress(&self) -> Result<Option<ProgressSnapshot>> {
        self.call_as(Action::GetUserProgress).await
    }

    /// Marks the interaction completed without changing the score.
    pub async fn mark_completed(&self) -> Result<ProgressSnapshot> {
        self.call_as(Action::MarkCompleted).await
    }

    /// Increments the attempt counter without scoring.
    pub async fn increment_attempts(&self) -> Result<ProgressSnapshot> {
        self.call_as(Action::IncrementAttempts).await
    }

    /// Reads the current user's public profile.
    pub async fn public_profile(&self) -> Result<PublicProfile> {
        self.call_as(Action::GetUserPublicProfile).await
    }

    // ------------------------------------------------------------------------
    // Media capabilities
    // ------------------------------------------------------------------------

    /// Starts media playback. Fire-and-forget.
    pub fn play_media(&self) -> Result<()> {
        self.cast(Action::PlayMedia)
    }

    /// Pauses media playback. Fire-and-forget.
    pub fn pause_media(&self) -> Result<()> {
        self.cast(Action::PauseMedia)
    }

    /// Seeks media playback. Fire-and-forget.
    pub fn seek_media(&self, position_seconds: f64) -> Result<()> {
        self.cast(Action::SeekMedia(SeekMediaPayload { position_seconds }))
    }

    /// Sets media volume. Fire-and-forget.
    pub fn set_media_volume(&self, volume: f64) -> Result<()> {
        self.cast(Action::SetMediaVolume(SetVolumePayload { volume }))
    }

    /// Reads the current media position in seconds.
    pub async fn media_current_time(&self) -> Result<f64> {
        self.call_as::<MediaPosition>(Action::GetMediaCurrentTime)
            .await
            .map(|p| p.seconds)
    }

    /// Reads the media duration in seconds.
    pub async fn media_duration(&self) -> Result<f64> {
        self.call_as::<MediaPosition>(Action::GetMediaDuration)
            .await
            .map(|p| p.seconds)
    }

    /// Reads whether media is currently playing.
    pub async fn is_media_playing(&self) -> Result<bool> {
        self.call_as::<MediaPlaying>(Action::IsMediaPlaying)
            .await
            .map(|p| p.playing)
    }
}

/// Drains host frames: responses feed the correlator, the readiness notice
/// trips the gate, anything else is discarded with a log line.
async fn dispatch_inbound(
    mut receiver: FrameReceiver,
    correlator: Arc<Correlator>,
    gate: Arc<ReadinessGate>,
) {
    while let Some(frame) = receiver.recv().await {
        match serde_json::from_str::<HostMessage>(&frame) {
            Ok(HostMessage::Response(response)) => {
                if !correlator.resolve(response).await {
                    debug!("late or duplicate response discarded");
                }
            }
            Ok(HostMessage::Ready(notice)) => {
                if notice.ready {
                    if let Err(e) = gate.mark_ready() {
                        warn!(error = %e, "ignoring readiness notice");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "discarding malformed host frame");
            }
        }
    }
    debug!("host channel closed; dispatch task exiting");
}

// ============================================================================
// Tests
// ============================================================================
