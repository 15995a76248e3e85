//! The host-side capability router.
//!
//! One router serves one bridge session: it is bound to a [`SessionContext`]
//! at construction, sends the readiness notice when it attaches to the
//! channel, and then answers frames until the content endpoint goes away.
//!
//! Dispatch is an exhaustive match over the closed [`Action`] enum. Frames
//! whose verb falls outside the protocol (a stale or malformed content
//! bundle) degrade to an error response instead of crashing the router.
//! Every handler applies its side effects before the response is sent, so a
//! caller awaiting the callback observes fully committed state.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use lectern_bridge::protocol::{
    Action, EventOutcome, MediaPlaying, MediaPosition, RawRequest, ReadyNotice, ResponseEnvelope,
    SaveProgressOutcome, SaveProgressPayload,
};
use lectern_bridge::transport::Endpoint;
use lectern_results::{sanitize_score, ResultsService};

use crate::capabilities::{
    EventBroadcaster, EventResponder, InMemoryDirectory, LessonEvent, MediaController,
    ProfileDirectory, SharedLessonState, SimulatedPlayer, UiSurface,
};
use crate::error::{HostError, Result};
use crate::scoring::{ResultsSink, ScoreSubmission};
use crate::store::{MemoryStore, ProgressStore, SessionContext, StoreLimits};

/// Duration of the simulated media element used when no controller is wired.
const DEFAULT_MEDIA_DURATION_SECONDS: f64 = 300.0;

/// Routes capability calls for one bridge session.
///
/// Cheap to clone; clones share every surface and store.
#[derive(Clone)]
pub struct CapabilityRouter {
    ctx: SessionContext,
    limits: StoreLimits,
    state: SharedLessonState,
    ui: UiSurface,
    events: EventBroadcaster,
    store: Arc<dyn ProgressStore>,
    results: Arc<dyn ResultsSink>,
    media: Arc<dyn MediaController>,
    profiles: Arc<dyn ProfileDirectory>,
    responder: Option<Arc<dyn EventResponder>>,
}

impl CapabilityRouter {
    /// Creates a router with in-memory surfaces and a fresh results ledger.
    #[must_use]
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            limits: StoreLimits::default(),
            state: SharedLessonState::new(),
            ui: UiSurface::new(),
            events: EventBroadcaster::default(),
            store: Arc::new(MemoryStore::new()),
            results: Arc::new(ResultsService::new()),
            media: Arc::new(SimulatedPlayer::new(DEFAULT_MEDIA_DURATION_SECONDS)),
            profiles: Arc::new(InMemoryDirectory::new()),
            responder: None,
        }
    }

    /// Replaces the progress/instance-data store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ProgressStore>) -> Self {
        self.store = store;
        self
    }

    /// Replaces the scoring sink.
    #[must_use]
    pub fn with_results(mut self, results: Arc<dyn ResultsSink>) -> Self {
        self.results = results;
        self
    }

    /// Replaces the media controller.
    #[must_use]
    pub fn with_media(mut self, media: Arc<dyn MediaController>) -> Self {
        self.media = media;
        self
    }

    /// Replaces the profile directory.
    #[must_use]
    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileDirectory>) -> Self {
        self.profiles = profiles;
        self
    }

    /// Wires the responder for events flagged `awaitsResponse`.
    #[must_use]
    pub fn with_responder(mut self, responder: Arc<dyn EventResponder>) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Overrides the history scan bounds.
    #[must_use]
    pub fn with_limits(mut self, limits: StoreLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The lesson shell this session mutates.
    #[must_use]
    pub const fn ui(&self) -> &UiSurface {
        &self.ui
    }

    /// The event stream this session emits into.
    #[must_use]
    pub const fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    /// The shared lesson state document.
    #[must_use]
    pub const fn shared_state(&self) -> &SharedLessonState {
        &self.state
    }

    /// Serves one channel until the content endpoint goes away.
    ///
    /// Sends the readiness notice first; content constructed before this
    /// point is queued on its readiness gate and proceeds once the notice
    /// lands.
    pub async fn serve(self, endpoint: Endpoint) {
        let (sender, mut receiver) = endpoint.split();

        match serde_json::to_string(&ReadyNotice { ready: true }) {
            Ok(frame) => {
                if sender.send(frame).is_err() {
                    warn!("content endpoint closed before readiness notice");
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "could not encode readiness notice");
                return;
            }
        }
        info!(
            user_id = %self.ctx.user_id,
            lesson_id = %self.ctx.lesson_id,
            interaction_type_id = %self.ctx.interaction_type_id,
            "capability router attached"
        );

        while let Some(frame) = receiver.recv().await {
            if let Some(reply) = self.handle_frame(&frame).await {
                if sender.send(reply).is_err() {
                    debug!("content endpoint closed; stopping router");
                    break;
                }
            }
        }
        debug!("content channel drained; router exiting");
    }

    /// Spawns [`Self::serve`] on the runtime.
    pub fn spawn(self, endpoint: Endpoint) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.serve(endpoint))
    }

    /// Processes one inbound frame; returns the serialized reply, if one is
    /// owed.
    async fn handle_frame(&self, frame: &str) -> Option<String> {
        let raw: RawRequest = match serde_json::from_str(frame) {
            Ok(raw) => raw,
            Err(e) => {
                // Without even a requestId there is nothing to correlate an
                // error to; the frame is logged and dropped.
                warn!(error = %e, "discarding unparseable frame");
                return None;
            }
        };
        let request_id = raw.request_id.clone();

        let action = match raw.decode() {
            Ok(action) => action,
            Err(decode_err) => {
                let error = if Action::is_known_verb(&raw.action) {
                    warn!(verb = %raw.action, error = %decode_err, "malformed payload");
                    format!("malformed payload for {}: {decode_err}", raw.action)
                } else {
                    warn!(verb = %raw.action, "unknown action verb");
                    HostError::unrecognized(raw.action.clone()).to_string()
                };
                return match request_id {
                    Some(id) => encode_response(ResponseEnvelope::err(id, error)),
                    None => None,
                };
            }
        };

        let verb = action.verb();
        debug!(action = verb, correlated = request_id.is_some(), "dispatching");
        let outcome = self.dispatch(action).await;

        match request_id {
            Some(id) => {
                let response = match outcome {
                    Ok(result) => ResponseEnvelope::ok(id, result),
                    Err(e) => {
                        warn!(action = verb, error = %e, "capability handler failed");
                        ResponseEnvelope::err(id, e.to_string())
                    }
                };
                encode_response(response)
            }
            None => {
                if let Err(e) = outcome {
                    warn!(action = verb, error = %e, "fire-and-forget capability failed");
                }
                None
            }
        }
    }

    /// Exhaustive dispatch over the protocol's verb set.
    async fn dispatch(&self, action: Action) -> Result<Value> {
        match action {
            // ---------------------------------------------------------------- state
            Action::EmitEvent(payload) => {
                let observers = self
                    .events
                    .send(LessonEvent::new(payload.name.clone(), payload.data.clone()));
                debug!(event = %payload.name, observers, "event emitted");

                if payload.awaits_response {
                    let responder = self.responder.as_ref().ok_or_else(|| {
                        HostError::responder("event awaits a response but none is configured")
                    })?;
                    let reply = responder.respond(&payload.name, &payload.data).await?;
                    return Ok(serde_json::to_value(EventOutcome {
                        acknowledged: true,
                        reply: Some(reply),
                    })?);
                }
                Ok(serde_json::to_value(EventOutcome {
                    acknowledged: true,
                    reply: None,
                })?)
            }
            Action::UpdateState(payload) => {
                self.state.update(payload.state).await;
                Ok(acknowledged())
            }
            Action::GetState => Ok(self.state.snapshot().await),

            // ---------------------------------------------------------------- ui
            Action::MinimizeChatUi => {
                self.ui.minimize_chat().await;
                Ok(acknowledged())
            }
            Action::ShowChatUi => {
                self.ui.show_chat().await;
                Ok(acknowledged())
            }
            Action::ActivateFullscreen => {
                self.ui.set_fullscreen(true).await;
                Ok(acknowledged())
            }
            Action::DeactivateFullscreen => {
                self.ui.set_fullscreen(false).await;
                Ok(acknowledged())
            }
            Action::PostToChat(payload) => {
                self.ui.post_chat(payload.message).await;
                Ok(acknowledged())
            }
            Action::ShowScript => {
                self.ui.show_script().await;
                Ok(acknowledged())
            }
            Action::ShowSnack(payload) => {
                self.ui
                    .show_snack(payload.message, payload.duration_ms)
                    .await;
                Ok(acknowledged())
            }
            Action::HideSnack => {
                self.ui.hide_snack().await;
                Ok(acknowledged())
            }
            Action::ShowOverlayHtml(payload) => {
                self.ui.show_overlay(payload.html).await;
                Ok(acknowledged())
            }
            Action::HideOverlayHtml => {
                self.ui.hide_overlay().await;
                Ok(acknowledged())
            }

            // ---------------------------------------------------------------- data
            Action::SaveInstanceData(payload) => {
                let record = self
                    .store
                    .append_instance_data(&self.ctx, payload.data)
                    .await?;
                Ok(serde_json::to_value(record)?)
            }
            Action::GetInstanceDataHistory(payload) => {
                let limit = self.limits.clamp(payload.limit);
                let history = self.store.instance_history(&self.ctx, limit).await?;
                Ok(serde_json::to_value(history)?)
            }
            Action::SaveUserProgress(payload) => {
                let outcome = self.save_user_progress(payload).await?;
                Ok(serde_json::to_value(outcome)?)
            }
            Action::GetUserProgress => {
                let progress = self.store.progress(&self.ctx).await?;
                Ok(serde_json::to_value(progress)?)
            }
            Action::MarkCompleted => {
                let progress = self.store.mark_completed(&self.ctx).await?;
                Ok(serde_json::to_value(progress)?)
            }
            Action::IncrementAttempts => {
                let progress = self.store.increment_attempts(&self.ctx).await?;
                Ok(serde_json::to_value(progress)?)
            }
            Action::GetUserPublicProfile => {
                let profile = self.profiles.profile(&self.ctx.user_id).await?;
                Ok(serde_json::to_value(profile)?)
            }

            // ---------------------------------------------------------------- media
            Action::PlayMedia => {
                self.media.play().await?;
                Ok(acknowledged())
            }
            Action::PauseMedia => {
                self.media.pause().await?;
                Ok(acknowledged())
            }
            Action::SeekMedia(payload) => {
                self.media.seek(payload.position_seconds).await?;
                Ok(acknowledged())
            }
            Action::SetMediaVolume(payload) => {
                self.media.set_volume(payload.volume).await?;
                Ok(acknowledged())
            }
            Action::GetMediaCurrentTime => {
                let seconds = self.media.current_time().await?;
                Ok(serde_json::to_value(MediaPosition { seconds })?)
            }
            Action::GetMediaDuration => {
                let seconds = self.media.duration().await?;
                Ok(serde_json::to_value(MediaPosition { seconds })?)
            }
            Action::IsMediaPlaying => {
                let playing = self.media.is_playing().await?;
                Ok(serde_json::to_value(MediaPlaying { playing })?)
            }
        }
    }

    /// The save-user-progress flow: sanitize, upsert, forward, respond.
    ///
    /// The progress upsert commits first; a scoring-pipeline failure then
    /// downgrades the response to `stats: None` instead of losing the save.
    async fn save_user_progress(
        &self,
        payload: SaveProgressPayload,
    ) -> Result<SaveProgressOutcome> {
        let score = sanitize_score(payload.score);
        let progress = self
            .store
            .save_progress(&self.ctx, score, payload.completed, payload.custom_data.clone())
            .await?;

        let submission = ScoreSubmission {
            score,
            time_taken_seconds: payload.time_taken_seconds,
            attempts: progress.attempts,
            result_data: payload.custom_data,
            completed_at: progress.updated_at,
        };
        let stats = match self.results.record(&self.ctx, submission).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(error = %e, "averaging pipeline unavailable; progress saved without stats");
                None
            }
        };

        info!(
            user_id = %self.ctx.user_id,
            interaction_type_id = %self.ctx.interaction_type_id,
            score,
            attempts = progress.attempts,
            completed = progress.completed,
            "user progress saved"
        );
        Ok(SaveProgressOutcome { progress, stats })
    }
}

/// Canonical result for capabilities that only acknowledge.
fn acknowledged() -> Value {
    json!({"acknowledged": true})
}

/// Serializes a response envelope, logging instead of crashing on the
/// (never expected) encoding failure.
fn encode_response(response: ResponseEnvelope) -> Option<String> {
    match serde_json::to_string(&response) {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(error = %e, "could not encode response envelope");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
