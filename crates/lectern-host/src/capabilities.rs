//! Host capability seams behind the router.
//!
//! The router itself only dispatches; the actual surfaces live here. UI and
//! shared lesson state are concrete (they are plain host memory), while
//! media playback, profile lookup, and the LLM event responder are traits:
//! production hosts wire their own video-provider client or responder, and
//! the in-memory implementations back tests and the demo binary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use lectern_bridge::protocol::PublicProfile;

use crate::error::{HostError, Result};

// ============================================================================
// Events
// ============================================================================

/// One event emitted by lesson content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonEvent {
    /// Event name, defined by the interaction type.
    pub name: String,
    /// Arbitrary event data.
    pub data: Value,
    /// When the host received the event.
    pub timestamp: DateTime<Utc>,
}

impl LessonEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts lesson events to host observers.
///
/// Uses a tokio broadcast channel for pub-sub distribution. Events are not
/// persisted for observers that attach later.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<LessonEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster with the given per-subscriber buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber for receiving events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LessonEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event; returns how many observers will see it.
    pub fn send(&self, event: LessonEvent) -> usize {
        // send() errs only when no receivers exist, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active observers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Produces the asynchronous reply for events flagged `awaitsResponse`.
///
/// Production hosts back this with a language-model pipeline; that pipeline
/// is outside this crate, so only the seam is defined here.
#[async_trait]
pub trait EventResponder: Send + Sync {
    /// Produces a reply for the named event.
    async fn respond(&self, name: &str, data: &Value) -> Result<String>;
}

// ============================================================================
// Shared lesson state
// ============================================================================

/// The lesson state document shared between content and host.
///
/// `update` merges object fragments shallowly (top-level keys win); any
/// non-object fragment replaces the document wholesale.
#[derive(Debug, Clone, Default)]
pub struct SharedLessonState {
    doc: Arc<Mutex<Value>>,
}

impl SharedLessonState {
    /// Creates an empty state document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a fragment into the document.
    pub async fn update(&self, fragment: Value) {
        let mut doc = self.doc.lock().await;
        match (&mut *doc, fragment) {
            (Value::Object(current), Value::Object(incoming)) => {
                for (key, value) in incoming {
                    current.insert(key, value);
                }
            }
            (current, incoming) => *current = incoming,
        }
    }

    /// Returns a copy of the current document.
    pub async fn snapshot(&self) -> Value {
        self.doc.lock().await.clone()
    }
}

// ============================================================================
// UI surface
// ============================================================================

/// One message posted to the lesson chat by content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPost {
    /// Message text.
    pub message: String,
    /// When it was posted.
    pub posted_at: DateTime<Utc>,
}

/// A transient snack notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnackNotice {
    /// Notification text.
    pub message: String,
    /// When it was shown.
    pub shown_at: DateTime<Utc>,
}

/// Observable UI state of the lesson shell.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Whether the chat panel is collapsed.
    pub chat_minimized: bool,
    /// Whether fullscreen presentation is active.
    pub fullscreen: bool,
    /// Whether the lesson script panel is visible.
    pub script_visible: bool,
    /// Markup currently on the overlay surface, if shown.
    pub overlay_html: Option<String>,
    /// The snack notification currently shown, if any.
    pub snack: Option<SnackNotice>,
    /// Messages content has posted to the chat.
    pub chat_log: Vec<ChatPost>,
    snack_generation: u64,
}

/// The host's lesson shell, mutated by UI capability calls.
///
/// Each mutation completes before the router replies, so a caller awaiting
/// the callback observes the committed state; two calls issued in order are
/// applied in order.
#[derive(Debug, Clone, Default)]
pub struct UiSurface {
    inner: Arc<Mutex<UiState>>,
}

impl UiSurface {
    /// Creates a shell with everything hidden and expanded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current UI state.
    pub async fn snapshot(&self) -> UiState {
        self.inner.lock().await.clone()
    }

    /// Collapses the chat panel.
    pub async fn minimize_chat(&self) {
        self.inner.lock().await.chat_minimized = true;
    }

    /// Expands the chat panel.
    pub async fn show_chat(&self) {
        self.inner.lock().await.chat_minimized = false;
    }

    /// Enters or leaves fullscreen presentation.
    pub async fn set_fullscreen(&self, active: bool) {
        self.inner.lock().await.fullscreen = active;
    }

    /// Reveals the lesson script panel.
    pub async fn show_script(&self) {
        self.inner.lock().await.script_visible = true;
    }

    /// Appends a message to the chat log.
    pub async fn post_chat(&self, message: impl Into<String>) {
        self.inner.lock().await.chat_log.push(ChatPost {
            message: message.into(),
            posted_at: Utc::now(),
        });
    }

    /// Shows a snack notification, optionally auto-dismissed.
    ///
    /// The dismiss timer carries the snack's generation, so a timer from an
    /// earlier snack can never clear a newer one.
    pub async fn show_snack(&self, message: impl Into<String>, duration_ms: Option<u64>) {
        let generation = {
            let mut state = self.inner.lock().await;
            state.snack_generation += 1;
            state.snack = Some(SnackNotice {
                message: message.into(),
                shown_at: Utc::now(),
            });
            state.snack_generation
        };

        if let Some(ms) = duration_ms {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
                let mut state = inner.lock().await;
                if state.snack_generation == generation {
                    debug!("auto-dismissing snack");
                    state.snack = None;
                }
            });
        }
    }

    /// Dismisses the snack notification.
    pub async fn hide_snack(&self) {
        let mut state = self.inner.lock().await;
        // Bump the generation so a pending auto-dismiss timer goes stale.
        state.snack_generation += 1;
        state.snack = None;
    }

    /// Shows the overlay surface with the given markup.
    pub async fn show_overlay(&self, html: impl Into<String>) {
        self.inner.lock().await.overlay_html = Some(html.into());
    }

    /// Hides the overlay surface.
    pub async fn hide_overlay(&self) {
        self.inner.lock().await.overlay_html = None;
    }
}

// ============================================================================
// Media
// ============================================================================

/// Playback control for the media element backing an interaction.
///
/// Third-party video-provider clients implement this in the host
/// application; [`SimulatedPlayer`] backs tests and the demo binary.
#[async_trait]
pub trait MediaController: Send + Sync {
    /// Starts playback.
    async fn play(&self) -> Result<()>;
    /// Pauses playback.
    async fn pause(&self) -> Result<()>;
    /// Seeks to a position in seconds.
    async fn seek(&self, position_seconds: f64) -> Result<()>;
    /// Sets the volume in `[0.0, 1.0]`.
    async fn set_volume(&self, volume: f64) -> Result<()>;
    /// Current playback position in seconds.
    async fn current_time(&self) -> Result<f64>;
    /// Total duration in seconds.
    async fn duration(&self) -> Result<f64>;
    /// Whether playback is active.
    async fn is_playing(&self) -> Result<bool>;
}

#[derive(Debug)]
struct PlayerState {
    position: f64,
    volume: f64,
    playing: bool,
}

/// In-memory media player: position moves only on seek.
#[derive(Debug)]
pub struct SimulatedPlayer {
    duration: f64,
    state: Mutex<PlayerState>,
}

impl SimulatedPlayer {
    /// Creates a stopped player of the given duration.
    #[must_use]
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration: duration_seconds,
            state: Mutex::new(PlayerState {
                position: 0.0,
                volume: 1.0,
                playing: false,
            }),
        }
    }
}

#[async_trait]
impl MediaController for SimulatedPlayer {
    async fn play(&self) -> Result<()> {
        self.state.lock().await.playing = true;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.state.lock().await.playing = false;
        Ok(())
    }

    async fn seek(&self, position_seconds: f64) -> Result<()> {
        if !position_seconds.is_finite() {
            return Err(HostError::media("seek position must be finite"));
        }
        self.state.lock().await.position = position_seconds.clamp(0.0, self.duration);
        Ok(())
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        if !volume.is_finite() {
            return Err(HostError::media("volume must be finite"));
        }
        self.state.lock().await.volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    async fn current_time(&self) -> Result<f64> {
        Ok(self.state.lock().await.position)
    }

    async fn duration(&self) -> Result<f64> {
        Ok(self.duration)
    }

    async fn is_playing(&self) -> Result<bool> {
        Ok(self.state.lock().await.playing)
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Lookup of public user profiles.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Returns the public profile for `user_id`.
    async fn profile(&self, user_id: &str) -> Result<PublicProfile>;
}

/// Directory over a fixed set of profiles.
///
/// Unknown users resolve to a minimal profile rather than an error: lesson
/// content only needs something presentable to render.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    profiles: HashMap<String, PublicProfile>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a profile, keyed by its user id.
    #[must_use]
    pub fn with_profile(mut self, profile: PublicProfile) -> Self {
        self.profiles.insert(profile.user_id.clone(), profile);
        self
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryDirectory {
    async fn profile(&self, user_id: &str) -> Result<PublicProfile> {
        Ok(self
            .profiles
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| PublicProfile {
                user_id: user_id.to_owned(),
                display_name: user_id.to_owned(),
                avatar_url: None,
            }))
    }
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
    // Broadcaster
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_broadcaster_send_receive() {
        let broadcaster = EventBroadcaster::new(10);
        let mut receiver = broadcaster.subscribe();

        let count = broadcaster.send(LessonEvent::new("answered", json!({"q": 1})));
        assert_eq!(count, 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, "answered");
        assert_eq!(event.data, json!({"q": 1}));
    }

    #[test]
    fn test_broadcaster_without_observers() {
        let broadcaster = EventBroadcaster::default();
        assert_eq!(broadcaster.receiver_count(), 0);
        // Must not panic with no subscribers.
        assert_eq!(broadcaster.send(LessonEvent::new("ignored", json!(null))), 0);
    }

    // ------------------------------------------------------------------------
    // Shared state
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_state_update_merges_top_level_keys() {
        let state = SharedLessonState::new();
        state.update(json!({"page": 1, "answers": []})).await;
        state.update(json!({"page": 2})).await;

        let doc = state.snapshot().await;
        assert_eq!(doc, json!({"page": 2, "answers": []}));
    }

    #[tokio::test]
    async fn test_state_non_object_fragment_replaces() {
        let state = SharedLessonState::new();
        state.update(json!({"page": 1})).await;
        state.update(json!("reset")).await;

        assert_eq!(state.snapshot().await, json!("reset"));
    }

    // ------------------------------------------------------------------------
    // UI surface
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_chat_and_fullscreen_toggles() {
        let ui = UiSurface::new();
        ui.minimize_chat().await;
        ui.set_fullscreen(true).await;

        let state = ui.snapshot().await;
        assert!(state.chat_minimized);
        assert!(state.fullscreen);

        ui.show_chat().await;
        ui.set_fullscreen(false).await;
        let state = ui.snapshot().await;
        assert!(!state.chat_minimized);
        assert!(!state.fullscreen);
    }

    #[tokio::test]
    async fn test_overlay_show_then_hide_ends_hidden() {
        let ui = UiSurface::new();
        ui.show_overlay("<p>done</p>").await;
        ui.hide_overlay().await;

        assert!(ui.snapshot().await.overlay_html.is_none());
    }

    #[tokio::test]
    async fn test_chat_posts_accumulate_in_order() {
        let ui = UiSurface::new();
        ui.post_chat("first").await;
        ui.post_chat("second").await;

        let log = ui.snapshot().await.chat_log;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "first");
        assert_eq!(log[1].message, "second");
    }

    #[tokio::test]
    async fn test_snack_auto_dismisses_after_duration() {
        let ui = UiSurface::new();
        ui.show_snack("Saved!", Some(10)).await;
        assert!(ui.snapshot().await.snack.is_some());

        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        assert!(ui.snapshot().await.snack.is_none());
    }

    #[tokio::test]
    async fn test_stale_dismiss_timer_cannot_clear_newer_snack() {
        let ui = UiSurface::new();
        ui.show_snack("first", Some(20)).await;
        ui.show_snack("second", None).await;

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        let snack = ui.snapshot().await.snack.unwrap();
        assert_eq!(snack.message, "second");
    }

    #[tokio::test]
    async fn test_hide_snack_clears_immediately() {
        let ui = UiSurface::new();
        ui.show_snack("transient", Some(10_000)).await;
        ui.hide_snack().await;
        assert!(ui.snapshot().await.snack.is_none());
    }

    // ------------------------------------------------------------------------
    // Media
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_player_play_pause_seek() {
        let player = SimulatedPlayer::new(300.0);
        assert!(!player.is_playing().await.unwrap());

        player.play().await.unwrap();
        assert!(player.is_playing().await.unwrap());

        player.seek(42.5).await.unwrap();
        assert!((player.current_time().await.unwrap() - 42.5).abs() < f64::EPSILON);

        player.pause().await.unwrap();
        assert!(!player.is_playing().await.unwrap());
        assert!((player.duration().await.unwrap() - 300.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_player_clamps_seek_and_volume() {
        let player = SimulatedPlayer::new(100.0);
        player.seek(500.0).await.unwrap();
        assert!((player.current_time().await.unwrap() - 100.0).abs() < f64::EPSILON);

        player.set_volume(2.5).await.unwrap();
        // Volume is internal state; a non-finite value is the only error.
        assert!(player.set_volume(f64::NAN).await.is_err());
        assert!(player.seek(f64::INFINITY).await.is_err());
    }

    // ------------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_directory_returns_registered_profile() {
        let directory = InMemoryDirectory::new().with_profile(PublicProfile {
            user_id: "u-1".to_string(),
            display_name: "Ada".to_string(),
            avatar_url: Some("https://cdn.example/ada.png".to_string()),
        });

        let profile = directory.profile("u-1").await.unwrap();
        assert_eq!(profile.display_name, "Ada");
    }

    #[tokio::test]
    async fn test_directory_synthesizes_unknown_users() {
        let directory = InMemoryDirectory::new();
        let profile = directory.profile("ghost").await.unwrap();
        assert_eq!(profile.user_id, "ghost");
        assert_eq!(profile.display_name, "ghost");
        assert!(profile.avatar_url.is_none());
    }
}
