//! Results API tests over real HTTP
//!
//! Spawns the axum server on an ephemeral port and drives it with a plain
//! HTTP client, the way a host backend deployment is consumed.

use serde_json::{json, Value};

use lectern_results::{create_router, AppState, ResultsService};

/// Binds the results API to an ephemeral port and returns its base URL.
async fn spawn_server() -> String {
    let router = create_router(AppState::new(ResultsService::new()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });

    format!("http://{addr}")
}

fn result_body(score: Value) -> Value {
    json!({
        "lessonId": "lesson-fractions",
        "stageId": "stage-1",
        "substageId": "substage-2",
        "interactionTypeId": "quiz",
        "score": score,
        "timeTakenSeconds": 30.0,
        "resultData": {"answers": [1, 2, 3]}
    })
}

#[tokio::test]
async fn test_submit_and_read_average() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let expectations = [(80.0, 80.0, 1), (60.0, 70.0, 2), (100.0, 80.0, 3)];
    for (score, expected_average, expected_total) in expectations {
        let body: Value = client
            .post(format!("{base}/interaction-results"))
            .header("x-user-id", "student-1")
            .json(&result_body(json!(score)))
            .send()
            .await
            .expect("request failed")
            .json()
            .await
            .expect("bad json");

        assert_eq!(body["saved"], json!(true));
        assert_eq!(body["classAverage"], json!(expected_average));
        assert_eq!(body["totalAttempts"], json!(expected_total));
    }

    let body: Value = client
        .get(format!(
            "{base}/interaction-results/average/quiz/lesson-fractions/substage-2"
        ))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("bad json");

    assert_eq!(body["avgScore"], json!(80.0));
    assert_eq!(body["totalAttempts"], json!(3));
    assert_eq!(body["avgTimeSeconds"], json!(30.0));
}

#[tokio::test]
async fn test_first_submission_percentile_is_50() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{base}/interaction-results"))
        .header("x-user-id", "student-1")
        .json(&result_body(json!(42.0)))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("bad json");

    assert_eq!(body["percentile"], json!(50));
}

#[tokio::test]
async fn test_tied_scores_rank_at_zero() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    for i in 0..9 {
        client
            .post(format!("{base}/interaction-results"))
            .header("x-user-id", format!("student-{i}"))
            .json(&result_body(json!(70.0)))
            .send()
            .await
            .expect("request failed");
    }

    let body: Value = client
        .post(format!("{base}/interaction-results"))
        .header("x-user-id", "latecomer")
        .json(&result_body(json!(70.0)))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("bad json");

    // Strict less-than semantics: a ten-way tie ranks at the bottom.
    assert_eq!(body["percentile"], json!(0));
    assert_eq!(body["totalAttempts"], json!(10));
}

#[tokio::test]
async fn test_null_score_is_stored_as_zero() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{base}/interaction-results"))
        .header("x-user-id", "student-1")
        .json(&result_body(json!(null)))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("bad json");

    assert_eq!(body["yourScore"], json!(0.0));
    assert_eq!(body["classAverage"], json!(0.0));
}

#[tokio::test]
async fn test_missing_identity_header_is_rejected() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/interaction-results"))
        .json(&result_body(json!(80.0)))
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("bad json");
    assert!(body["error"].as_str().expect("no error").contains("x-user-id"));
}

#[tokio::test]
async fn test_average_for_unknown_placement_has_defaults() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!(
            "{base}/interaction-results/average/quiz/never-taught/substage-9"
        ))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("bad json");

    assert_eq!(body["avgScore"], json!(null));
    assert_eq!(body["totalAttempts"], json!(0));
    assert_eq!(body["avgTimeSeconds"], json!(null));
}

#[tokio::test]
async fn test_tenant_header_scopes_reads_and_writes() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/interaction-results"))
        .header("x-user-id", "student-1")
        .header("x-tenant-id", "acme")
        .json(&result_body(json!(90.0)))
        .send()
        .await
        .expect("request failed");

    // Tenantless read sees nothing for the placement.
    let body: Value = client
        .get(format!(
            "{base}/interaction-results/average/quiz/lesson-fractions/substage-2"
        ))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("bad json");
    assert_eq!(body["totalAttempts"], json!(0));

    // Scoped read sees the row.
    let body: Value = client
        .get(format!(
            "{base}/interaction-results/average/quiz/lesson-fractions/substage-2"
        ))
        .header("x-tenant-id", "acme")
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("bad json");
    assert_eq!(body["avgScore"], json!(90.0));
    assert_eq!(body["totalAttempts"], json!(1));
}
