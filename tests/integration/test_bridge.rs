//! End-to-end bridge tests
//!
//! These tests wire real channel pairs between a content-side bridge and a
//! host-side capability router, exercising the full capability surface the
//! way sandboxed lesson content would.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use lectern_bridge::{channel_pair, BridgeConfig, LessonBridge};
use lectern_host::{CapabilityRouter, MemoryStore, SessionContext};
use lectern_results::ResultsService;

fn ctx_for(user: &str) -> SessionContext {
    SessionContext {
        user_id: user.to_string(),
        tenant_id: None,
        lesson_id: "lesson-fractions".to_string(),
        stage_id: "stage-1".to_string(),
        substage_id: "substage-2".to_string(),
        interaction_type_id: "quiz".to_string(),
    }
}

/// Spawns a router for `user` and connects a bridge to it.
async fn session_for(user: &str) -> LessonBridge {
    let (content, host) = channel_pair();
    CapabilityRouter::new(ctx_for(user)).spawn(host);
    LessonBridge::connect(content, BridgeConfig::default())
        .await
        .expect("bridge failed to become ready")
}

/// Spawns a router sharing the given stores, for multi-student scenarios.
async fn shared_session_for(
    user: &str,
    store: Arc<MemoryStore>,
    results: Arc<ResultsService>,
) -> LessonBridge {
    let (content, host) = channel_pair();
    CapabilityRouter::new(ctx_for(user))
        .with_store(store)
        .with_results(results)
        .spawn(host);
    LessonBridge::connect(content, BridgeConfig::default())
        .await
        .expect("bridge failed to become ready")
}

#[tokio::test]
async fn test_bridge_connects_even_when_host_attaches_late() {
    let (content, host) = channel_pair();

    // The host router attaches only after content started waiting.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        CapabilityRouter::new(ctx_for("patient")).serve(host).await;
    });

    let bridge = LessonBridge::connect(content, BridgeConfig::default())
        .await
        .expect("bridge should ready up once the host attaches");
    assert_eq!(bridge.in_flight().await, 0);
}

#[tokio::test]
async fn test_save_progress_returns_committed_record_and_stats() {
    let bridge = session_for("alice").await;

    let outcome = bridge
        .save_user_progress(80.0, true, Some(42.0), json!({"answers": [1, 2, 3]}))
        .await
        .expect("save failed");

    assert_eq!(outcome.progress.attempts, 1);
    assert!((outcome.progress.score - 80.0).abs() < f64::EPSILON);
    assert!(outcome.progress.completed);
    assert!(outcome.progress.completed_at.is_some());

    let stats = outcome.stats.expect("stats missing");
    assert!((stats.your_score - 80.0).abs() < f64::EPSILON);
    assert!((stats.class_average - 80.0).abs() < f64::EPSILON);
    assert_eq!(stats.total_attempts, 1);
    assert_eq!(stats.percentile, 50);
}

#[tokio::test]
async fn test_class_average_across_three_students() {
    let store = Arc::new(MemoryStore::new());
    let results = Arc::new(ResultsService::new());

    let expectations = [("alice", 80.0, 80.0, 1), ("bob", 60.0, 70.0, 2), ("carol", 100.0, 80.0, 3)];
    for (user, score, expected_average, expected_total) in expectations {
        let bridge = shared_session_for(user, Arc::clone(&store), Arc::clone(&results)).await;
        let outcome = bridge
            .save_user_progress(score, true, None, json!({}))
            .await
            .expect("save failed");

        let stats = outcome.stats.expect("stats missing");
        assert!(
            (stats.class_average - expected_average).abs() < f64::EPSILON,
            "after {user}: average {} expected {expected_average}",
            stats.class_average
        );
        assert_eq!(stats.total_attempts, expected_total);
    }
}

#[tokio::test]
async fn test_nan_score_degrades_to_zero_end_to_end() {
    let bridge = session_for("divide-by-zero").await;

    // Content-side arithmetic produced NaN; it crosses the wire as null.
    let outcome = bridge
        .save_user_progress(f64::NAN, false, None, json!({}))
        .await
        .expect("save failed");

    assert!((outcome.progress.score - 0.0).abs() < f64::EPSILON);
    assert!((outcome.stats.expect("stats missing").your_score - 0.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_attempts_climb_across_saves_and_increments() {
    let bridge = session_for("persistent").await;

    let first = bridge
        .save_user_progress(40.0, false, None, json!({}))
        .await
        .expect("save failed");
    assert_eq!(first.progress.attempts, 1);

    let incremented = bridge.increment_attempts().await.expect("increment failed");
    assert_eq!(incremented.attempts, 2);
    // Score untouched by the bare increment.
    assert!((incremented.score - 40.0).abs() < f64::EPSILON);

    let second = bridge
        .save_user_progress(90.0, true, None, json!({}))
        .await
        .expect("save failed");
    assert_eq!(second.progress.attempts, 3);
}

#[tokio::test]
async fn test_user_progress_absent_then_present() {
    let bridge = session_for("fresh").await;

    assert!(bridge.user_progress().await.expect("get failed").is_none());

    bridge
        .save_user_progress(55.0, false, None, json!({}))
        .await
        .expect("save failed");

    let progress = bridge
        .user_progress()
        .await
        .expect("get failed")
        .expect("progress should exist");
    assert!((progress.score - 55.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_instance_data_history_round_trip() {
    let bridge = session_for("collector").await;

    for i in 0..5 {
        bridge
            .save_instance_data(json!({ "observation": i }))
            .await
            .expect("append failed");
    }

    let history = bridge
        .instance_history(Some(3))
        .await
        .expect("history failed");
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].data, json!({"observation": 4}));
    assert_eq!(history[2].data, json!({"observation": 2}));
}

#[tokio::test]
async fn test_overlay_hidden_despite_pending_save() {
    let (content, host) = channel_pair();
    let router = CapabilityRouter::new(ctx_for("racer"));
    let shell = router.clone();
    router.spawn(host);
    let bridge = LessonBridge::connect(content, BridgeConfig::default())
        .await
        .expect("bridge failed to become ready");

    // A save is in flight while the overlay is toggled; the ordered channel
    // guarantees show-then-hide applies in that order regardless.
    let pending_save = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .save_user_progress(70.0, false, None, json!({"big": "payload"}))
                .await
        })
    };

    bridge
        .show_overlay("<section>summary</section>")
        .await
        .expect("show failed");
    bridge.hide_overlay().await.expect("hide failed");

    pending_save
        .await
        .expect("join failed")
        .expect("save failed");

    // Both calls have been acknowledged, so the shell state is committed.
    assert!(shell.ui().snapshot().await.overlay_html.is_none());
}

#[tokio::test]
async fn test_ui_and_chat_capabilities_acknowledge() {
    let bridge = session_for("presenter").await;

    bridge.minimize_chat().await.expect("minimize failed");
    bridge.show_chat().await.expect("show chat failed");
    bridge
        .activate_fullscreen()
        .await
        .expect("fullscreen failed");
    bridge
        .deactivate_fullscreen()
        .await
        .expect("unfullscreen failed");
    bridge
        .post_to_chat("look at question two")
        .await
        .expect("post failed");
    bridge.show_script().await.expect("script failed");
    bridge
        .show_snack("Saved!", Some(50))
        .await
        .expect("snack failed");
    bridge.hide_snack().await.expect("hide snack failed");
}

#[tokio::test]
async fn test_shared_state_round_trip() {
    let bridge = session_for("stateful").await;

    bridge
        .update_state(json!({"page": 1, "answers": [true]}))
        .await
        .expect("update failed");
    bridge
        .update_state(json!({"page": 2}))
        .await
        .expect("update failed");

    let state = bridge.state().await.expect("get failed");
    assert_eq!(state, json!({"page": 2, "answers": [true]}));
}

#[tokio::test]
async fn test_media_control_and_queries() {
    let bridge = session_for("viewer").await;

    assert!(!bridge.is_media_playing().await.expect("query failed"));

    bridge.play_media().expect("play failed");
    bridge.seek_media(25.0).expect("seek failed");

    // Fire-and-forget commands and a correlated query interleave on the
    // same ordered channel, so the query observes both effects.
    assert!(bridge.is_media_playing().await.expect("query failed"));
    let position = bridge.media_current_time().await.expect("query failed");
    assert!((position - 25.0).abs() < f64::EPSILON);

    let duration = bridge.media_duration().await.expect("query failed");
    assert!(duration > 0.0);
}

#[tokio::test]
async fn test_emit_event_and_profile() {
    let bridge = session_for("social").await;

    let outcome = bridge
        .emit_event("answered", json!({"q": 1}), false)
        .await
        .expect("emit failed");
    assert!(outcome.acknowledged);
    assert!(outcome.reply.is_none());

    let profile = bridge.public_profile().await.expect("profile failed");
    assert_eq!(profile.user_id, "social");
}

#[tokio::test]
async fn test_many_concurrent_saves_each_resolve_once() {
    let bridge = session_for("storm").await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let bridge = bridge.clone();
        handles.push(tokio::spawn(async move {
            bridge
                .save_user_progress(f64::from(i) * 10.0, false, None, json!({ "i": i }))
                .await
        }));
    }

    let mut attempts: Vec<u32> = Vec::new();
    for handle in handles {
        let outcome = handle
            .await
            .expect("join failed")
            .expect("save failed");
        attempts.push(outcome.progress.attempts);
    }
    attempts.sort_unstable();

    // Every call resolved exactly once, each with a distinct attempt count.
    assert_eq!(attempts, (1..=10).collect::<Vec<u32>>());
    assert_eq!(bridge.in_flight().await, 0);
}
