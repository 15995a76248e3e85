//! Wire protocol for the content/host bridge.
//!
//! Every capability call crosses the sandbox boundary as a serialized JSON
//! frame of the form `{action, payload, requestId}`; the host answers with a
//! correlated `{requestId, result, error}` frame. The action verb set is
//! closed: it is modeled as the [`Action`] enum so the router can match it
//! exhaustively, with unknown verbs handled through the tolerant
//! [`RawRequest`] form instead of a failed parse.
//!
//! # Frames
//!
//! - Content -> host: [`RequestEnvelope`] (fire-and-forget calls omit
//!   `requestId`)
//! - Host -> content: [`HostMessage`], either a [`ResponseEnvelope`] or the
//!   one-shot [`ReadyNotice`]
//!
//! # Scores on the wire
//!
//! JSON cannot represent `NaN` or `Infinity`, so a non-finite score produced
//! by content-side arithmetic serializes as `null`. Score fields are
//! therefore `Option<f64>` and the host coerces `None` to the safe default
//! before anything is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Capability payloads
// ============================================================================

/// Payload for `emit-event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitEventPayload {
    /// Event name, defined by the interaction type.
    pub name: String,

    /// Arbitrary event data.
    #[serde(default)]
    pub data: Value,

    /// When `true`, the host must produce an asynchronous reply (for example
    /// from a language-model responder) before the call completes.
    #[serde(default)]
    pub awaits_response: bool,
}

/// Payload for `update-state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatePayload {
    /// State fragment to merge into the shared lesson state.
    pub state: Value,
}

/// Payload for `post-to-chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostToChatPayload {
    /// Message text to append to the lesson chat.
    pub message: String,
}

/// Payload for `show-snack`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSnackPayload {
    /// Notification text.
    pub message: String,

    /// Auto-dismiss delay in milliseconds; `None` keeps the snack visible
    /// until an explicit `hide-snack`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Payload for `show-overlay-html`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowOverlayPayload {
    /// Markup rendered on the overlay surface.
    pub html: String,
}

/// Payload for `save-instance-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveInstanceDataPayload {
    /// Snapshot data to append to the instance history.
    pub data: Value,
}

/// Payload for `get-instance-data-history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPayload {
    /// Maximum number of records to return, newest first. `None` asks for
    /// the host-configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Payload for `save-user-progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressPayload {
    /// Achieved score in `[0, 100]`. `None` is the wire shadow of a
    /// non-finite number and is coerced to 0 by the host.
    pub score: Option<f64>,

    /// Whether the interaction is complete.
    pub completed: bool,

    /// Time spent on this attempt, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken_seconds: Option<f64>,

    /// Interaction-defined payload stored alongside the attempt.
    #[serde(default)]
    pub custom_data: Value,
}

/// Payload for `seek-media`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekMediaPayload {
    /// Target playback position in seconds.
    pub position_seconds: f64,
}

/// Payload for `set-media-volume`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetVolumePayload {
    /// Volume in `[0.0, 1.0]`.
    pub volume: f64,
}

// ============================================================================
// Action enum
// ============================================================================

/// The closed set of capability verbs content may invoke.
///
/// Serialized adjacently tagged as `{"action": "<verb>", "payload": ...}`,
/// matching the wire protocol. Variants without a payload omit the
/// `payload` field entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "kebab-case")]
pub enum Action {
    /// Emit a named event to host observers.
    EmitEvent(EmitEventPayload),
    /// Merge a fragment into the shared lesson state.
    UpdateState(UpdateStatePayload),
    /// Read the shared lesson state.
    GetState,
    /// Collapse the chat UI.
    MinimizeChatUi,
    /// Expand the chat UI.
    ShowChatUi,
    /// Enter fullscreen presentation.
    ActivateFullscreen,
    /// Leave fullscreen presentation.
    DeactivateFullscreen,
    /// Append a message to the lesson chat.
    PostToChat(PostToChatPayload),
    /// Reveal the lesson script panel.
    ShowScript,
    /// Show a transient snack notification.
    ShowSnack(ShowSnackPayload),
    /// Dismiss the snack notification.
    HideSnack,
    /// Show the HTML overlay surface.
    ShowOverlayHtml(ShowOverlayPayload),
    /// Hide the HTML overlay surface.
    HideOverlayHtml,
    /// Append an instance-data snapshot.
    SaveInstanceData(SaveInstanceDataPayload),
    /// Read instance-data history, newest first.
    GetInstanceDataHistory(HistoryPayload),
    /// Save score/completion progress for the current user.
    SaveUserProgress(SaveProgressPayload),
    /// Read the current user's progress record.
    GetUserProgress,
    /// Mark the interaction completed without changing the score.
    MarkCompleted,
    /// Increment the attempt counter without scoring.
    IncrementAttempts,
    /// Read the current user's public profile.
    GetUserPublicProfile,
    /// Start media playback (fire-and-forget).
    PlayMedia,
    /// Pause media playback (fire-and-forget).
    PauseMedia,
    /// Seek media playback (fire-and-forget).
    SeekMedia(SeekMediaPayload),
    /// Set media volume (fire-and-forget).
    SetMediaVolume(SetVolumePayload),
    /// Read the current media position.
    GetMediaCurrentTime,
    /// Read the media duration.
    GetMediaDuration,
    /// Read whether media is playing.
    IsMediaPlaying,
}

impl Action {
    /// Every verb of the wire protocol, in protocol order.
    pub const VERBS: [&'static str; 27] = [
        "emit-event",
        "update-state",
        "get-state",
        "minimize-chat-ui",
        "show-chat-ui",
        "activate-fullscreen",
        "deactivate-fullscreen",
        "post-to-chat",
        "show-script",
        "show-snack",
        "hide-snack",
        "show-overlay-html",
        "hide-overlay-html",
        "save-instance-data",
        "get-instance-data-history",
        "save-user-progress",
        "get-user-progress",
        "mark-completed",
        "increment-attempts",
        "get-user-public-profile",
        "play-media",
        "pause-media",
        "seek-media",
        "set-media-volume",
        "get-media-current-time",
        "get-media-duration",
        "is-media-playing",
    ];

    /// Returns the wire verb for this action.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::EmitEvent(_) => "emit-event",
            Self::UpdateState(_) => "update-state",
            Self::GetState => "get-state",
            Self::MinimizeChatUi => "minimize-chat-ui",
            Self::ShowChatUi => "show-chat-ui",
            Self::ActivateFullscreen => "activate-fullscreen",
            Self::DeactivateFullscreen => "deactivate-fullscreen",
            Self::PostToChat(_) => "post-to-chat",
            Self::ShowScript => "show-script",
            Self::ShowSnack(_) => "show-snack",
            Self::HideSnack => "hide-snack",
            Self::ShowOverlayHtml(_) => "show-overlay-html",
            Self::HideOverlayHtml => "hide-overlay-html",
            Self::SaveInstanceData(_) => "save-instance-data",
            Self::GetInstanceDataHistory(_) => "get-instance-data-history",
            Self::SaveUserProgress(_) => "save-user-progress",
            Self::GetUserProgress => "get-user-progress",
            Self::MarkCompleted => "mark-completed",
            Self::IncrementAttempts => "increment-attempts",
            Self::GetUserPublicProfile => "get-user-public-profile",
            Self::PlayMedia => "play-media",
            Self::PauseMedia => "pause-media",
            Self::SeekMedia(_) => "seek-media",
            Self::SetMediaVolume(_) => "set-media-volume",
            Self::GetMediaCurrentTime => "get-media-current-time",
            Self::GetMediaDuration => "get-media-duration",
            Self::IsMediaPlaying => "is-media-playing",
        }
    }

    /// Returns `true` when the call correlates a response.
    ///
    /// Media transport commands are fire-and-forget: they carry no
    /// `requestId` and the router never answers them.
    #[must_use]
    pub const fn expects_response(&self) -> bool {
        !matches!(
            self,
            Self::PlayMedia | Self::PauseMedia | Self::SeekMedia(_) | Self::SetMediaVolume(_)
        )
    }

    /// Returns `true` if `verb` is part of the protocol.
    #[must_use]
    pub fn is_known_verb(verb: &str) -> bool {
        Self::VERBS.contains(&verb)
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// Outbound content -> host frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// The capability being invoked.
    #[serde(flatten)]
    pub action: Action,

    /// Correlation id; absent for fire-and-forget calls.
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Tolerant request form parsed by the host router.
///
/// Keeping the verb as a plain string lets the router answer an unknown or
/// malformed action with an error response instead of dropping the frame.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRequest {
    /// The action verb as sent.
    pub action: String,

    /// The raw payload, if any.
    #[serde(default)]
    pub payload: Option<Value>,

    /// Correlation id; absent for fire-and-forget calls.
    #[serde(rename = "requestId", default)]
    pub request_id: Option<String>,
}

impl RawRequest {
    /// Attempts to resolve this request into a typed [`Action`].
    ///
    /// # Errors
    ///
    /// Returns the underlying deserialization error when the verb is unknown
    /// or the payload does not match the verb's schema.
    pub fn decode(&self) -> serde_json::Result<Action> {
        let mut frame = serde_json::Map::with_capacity(2);
        frame.insert("action".to_owned(), Value::String(self.action.clone()));
        if let Some(payload) = &self.payload {
            frame.insert("payload".to_owned(), payload.clone());
        }
        serde_json::from_value(Value::Object(frame))
    }
}

/// Inbound host -> content correlated response.
///
/// Exactly one of `result` and `error` is non-null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Correlation id of the originating request.
    #[serde(rename = "requestId")]
    pub request_id: String,

    /// Successful result, when the handler succeeded.
    pub result: Option<Value>,

    /// Failure description, when the handler failed.
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Creates a successful response.
    #[must_use]
    pub const fn ok(request_id: String, result: Value) -> Self {
        Self {
            request_id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates a failed response.
    #[must_use]
    pub fn err(request_id: String, message: impl Into<String>) -> Self {
        Self {
            request_id,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// One-shot readiness push sent by the host once its router is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyNotice {
    /// Always `true`; retained on the wire for forward compatibility.
    pub ready: bool,
}

/// Any host -> content frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HostMessage {
    /// A correlated capability response.
    Response(ResponseEnvelope),
    /// The readiness notice.
    Ready(ReadyNotice),
}

// ============================================================================
// Result DTOs
// ============================================================================

/// Result of `emit-event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Whether the event reached the host.
    pub acknowledged: bool,

    /// Asynchronous reply, present when the event awaited one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

/// One append-only instance-data snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDataRecord {
    /// Snapshot payload.
    pub data: Value,

    /// When the snapshot was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// The per-user progress record for one interaction placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Owning user.
    pub user_id: String,
    /// Lesson the interaction belongs to.
    pub lesson_id: String,
    /// Stage within the lesson.
    pub stage_id: String,
    /// Substage within the stage.
    pub substage_id: String,
    /// Interaction type placed there.
    pub interaction_type_id: String,
    /// Latest saved score, always finite and in `[0, 100]`.
    pub score: f64,
    /// Whether the interaction has been completed.
    pub completed: bool,
    /// Total save/increment calls observed; at least 1.
    pub attempts: u32,
    /// Latest interaction-defined payload.
    pub custom_data: Value,
    /// Stamped once on the first completion, never cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Class statistics returned alongside a saved score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    /// The score that was just recorded.
    pub your_score: f64,
    /// Running class average after this result.
    pub class_average: f64,
    /// Results recorded for this placement, including this one.
    pub total_attempts: u64,
    /// Percent of prior results scoring strictly below this one.
    pub percentile: u32,
}

/// Result of `save-user-progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveProgressOutcome {
    /// The committed progress record.
    pub progress: ProgressSnapshot,

    /// Class statistics; `None` when the averaging pipeline was unavailable
    /// (the progress save itself still committed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ResultSummary>,
}

/// Result of `get-user-public-profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    /// Stable user identifier.
    pub user_id: String,
    /// Display name shown in lesson UI.
    pub display_name: String,
    /// Optional avatar location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Result of the media position/duration queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaPosition {
    /// Position or duration in seconds.
    pub seconds: f64,
}

/// Result of `is-media-playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPlaying {
    /// Whether playback is active.
    pub playing: bool,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    // ------------------------------------------------------------------------
    // Verb enumeration
    // ------------------------------------------------------------------------

    #[test]
    fn test_verb_table_is_exhaustive() {
        for verb in Action::VERBS {
            assert!(Action::is_known_verb(verb), "verb {verb} not recognized");
        }
        assert!(!Action::is_known_verb("self-destruct"));
    }

    #[test]
    fn test_verb_matches_serialized_tag() {
        let actions = vec![
            Action::GetState,
            Action::MinimizeChatUi,
            Action::ShowOverlayHtml(ShowOverlayPayload {
                html: "<b>hi</b>".to_string(),
            }),
            Action::IsMediaPlaying,
            Action::SaveUserProgress(SaveProgressPayload {
                score: Some(80.0),
                completed: true,
                time_taken_seconds: None,
                custom_data: Value::Null,
            }),
        ];
        for action in actions {
            let value = serde_json::to_value(&action).unwrap();
            assert_eq!(value["action"], json!(action.verb()));
        }
    }

    #[test]
    fn test_fire_and_forget_classification() {
        assert!(!Action::PlayMedia.expects_response());
        assert!(!Action::PauseMedia.expects_response());
        assert!(!Action::SeekMedia(SeekMediaPayload {
            position_seconds: 12.5
        })
        .expects_response());
        assert!(!Action::SetMediaVolume(SetVolumePayload { volume: 0.5 }).expects_response());

        assert!(Action::GetMediaCurrentTime.expects_response());
        assert!(Action::GetState.expects_response());
        assert!(Action::HideOverlayHtml.expects_response());
    }

    // ------------------------------------------------------------------------
    // Request envelope wire format
    // ------------------------------------------------------------------------

    #[test]
    fn test_request_with_payload_snapshot() {
        let envelope = RequestEnvelope {
            action: Action::ShowSnack(ShowSnackPayload {
                message: "Saved!".to_string(),
                duration_ms: Some(1500),
            }),
            request_id: Some("m1-0-abc".to_string()),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        insta::assert_snapshot!(
            json,
            @r#"{"action":"show-snack","payload":{"message":"Saved!","durationMs":1500},"requestId":"m1-0-abc"}"#
        );
    }

    #[test]
    fn test_unit_verb_omits_payload() {
        let envelope = RequestEnvelope {
            action: Action::GetState,
            request_id: Some("m1-1-def".to_string()),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        insta::assert_snapshot!(json, @r#"{"action":"get-state","requestId":"m1-1-def"}"#);
    }

    #[test]
    fn test_fire_and_forget_omits_request_id() {
        let envelope = RequestEnvelope {
            action: Action::PauseMedia,
            request_id: None,
        };
        let json = serde_json::to_string(&envelope).unwrap();
        insta::assert_snapshot!(json, @r#"{"action":"pause-media"}"#);
    }

    #[test]
    fn test_request_envelope_deserialization() {
        let json = r#"{"action":"seek-media","payload":{"positionSeconds":42.5}}"#;
        let envelope: RequestEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(
            envelope.action,
            Action::SeekMedia(SeekMediaPayload {
                position_seconds: 42.5
            })
        );
        assert!(envelope.request_id.is_none());
    }

    #[test]
    fn test_save_progress_nan_score_travels_as_null() {
        let payload = SaveProgressPayload {
            score: None,
            completed: false,
            time_taken_seconds: None,
            custom_data: json!({"answers": [1, 2]}),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""score":null"#));

        let back: SaveProgressPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.score, None);
    }

    // ------------------------------------------------------------------------
    // RawRequest
    // ------------------------------------------------------------------------

    #[test]
    fn test_raw_request_decodes_known_verb() {
        let raw: RawRequest = serde_json::from_str(
            r#"{"action":"post-to-chat","payload":{"message":"hello"},"requestId":"r-9"}"#,
        )
        .unwrap();
        assert_eq!(raw.request_id.as_deref(), Some("r-9"));

        let action = raw.decode().unwrap();
        assert_eq!(
            action,
            Action::PostToChat(PostToChatPayload {
                message: "hello".to_string()
            })
        );
    }

    #[test]
    fn test_raw_request_unknown_verb_fails_decode_not_parse() {
        let raw: RawRequest =
            serde_json::from_str(r#"{"action":"launch-rockets","requestId":"r-1"}"#).unwrap();
        assert_eq!(raw.action, "launch-rockets");
        assert!(raw.decode().is_err());
        assert!(!Action::is_known_verb(&raw.action));
    }

    #[test]
    fn test_raw_request_bad_payload_fails_decode() {
        let raw: RawRequest = serde_json::from_str(
            r#"{"action":"show-snack","payload":{"wrong":"shape"},"requestId":"r-2"}"#,
        )
        .unwrap();
        assert!(Action::is_known_verb(&raw.action));
        assert!(raw.decode().is_err());
    }

    // ------------------------------------------------------------------------
    // Response envelope and host messages
    // ------------------------------------------------------------------------

    #[test]
    fn test_response_ok_snapshot() {
        let response = ResponseEnvelope::ok("r-7".to_string(), json!({"acknowledged": true}));
        let json = serde_json::to_string(&response).unwrap();
        insta::assert_snapshot!(
            json,
            @r#"{"requestId":"r-7","result":{"acknowledged":true},"error":null}"#
        );
    }

    #[test]
    fn test_response_err_has_null_result() {
        let response = ResponseEnvelope::err("r-8".to_string(), "storage write failed");
        assert!(response.result.is_none());
        assert_eq!(response.error.as_deref(), Some("storage write failed"));
    }

    #[test]
    fn test_host_message_distinguishes_ready_from_response() {
        let ready: HostMessage = serde_json::from_str(r#"{"ready":true}"#).unwrap();
        assert!(matches!(ready, HostMessage::Ready(ReadyNotice { ready: true })));

        let response: HostMessage =
            serde_json::from_str(r#"{"requestId":"r-1","result":{},"error":null}"#).unwrap();
        assert!(matches!(response, HostMessage::Response(_)));
    }

    #[test]
    fn test_garbage_host_frame_fails_to_parse() {
        assert!(serde_json::from_str::<HostMessage>(r#"{"neither":"kind"}"#).is_err());
        assert!(serde_json::from_str::<HostMessage>("not json at all").is_err());
    }

    // ------------------------------------------------------------------------
    // Result DTOs
    // ------------------------------------------------------------------------

    #[test]
    fn test_progress_snapshot_serialization() {
        let snapshot = ProgressSnapshot {
            user_id: "u-1".to_string(),
            lesson_id: "l-1".to_string(),
            stage_id: "s-1".to_string(),
            substage_id: "ss-1".to_string(),
            interaction_type_id: "quiz".to_string(),
            score: 80.0,
            completed: true,
            attempts: 3,
            custom_data: json!({"answers": [true, false]}),
            completed_at: None,
            updated_at: DateTime::parse_from_rfc3339("2026-02-03T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains(r#""userId":"u-1""#));
        assert!(json.contains(r#""interactionTypeId":"quiz""#));
        assert!(json.contains(r#""attempts":3"#));
        // completed_at is skipped when absent
        assert!(!json.contains("completedAt"));
    }

    #[test]
    fn test_save_progress_outcome_without_stats() {
        let json = r#"{
            "progress": {
                "userId": "u-1",
                "lessonId": "l-1",
                "stageId": "s-1",
                "substageId": "ss-1",
                "interactionTypeId": "quiz",
                "score": 55.0,
                "completed": false,
                "attempts": 1,
                "customData": null,
                "updatedAt": "2026-02-03T10:00:00Z"
            }
        }"#;
        let outcome: SaveProgressOutcome = serde_json::from_str(json).unwrap();
        assert!(outcome.stats.is_none());
        assert_eq!(outcome.progress.attempts, 1);
    }

    #[test]
    fn test_result_summary_round_trip() {
        let summary = ResultSummary {
            your_score: 80.0,
            class_average: 72.5,
            total_attempts: 14,
            percentile: 64,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains(r#""yourScore":80.0"#));
        assert!(json.contains(r#""classAverage":72.5"#));

        let back: ResultSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
