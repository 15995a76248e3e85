//! HTTP API for the results service.
//!
//! This is the host-backend surface consumed by the bridge's persistence
//! capability (content never talks to it directly).
//!
//! # Endpoints
//!
//! - `POST /interaction-results` - Record a finalized score
//! - `GET /interaction-results/average/:interaction_type_id/:lesson_id/:substage_id`
//!   - Read the running average for a placement
//!
//! Identity rides in headers: `x-user-id` (required on POST) and
//! `x-tenant-id` (optional; scopes both writes and reads).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::service::{AverageSnapshot, InteractionKey, ResultDraft, ResultOutcome, ResultsService};

/// Response body for the average endpoint.
pub type AverageResponse = AverageSnapshot;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /interaction-results`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultRequest {
    /// Lesson identifier.
    pub lesson_id: String,
    /// Stage identifier.
    pub stage_id: String,
    /// Substage identifier.
    pub substage_id: String,
    /// Interaction type identifier.
    pub interaction_type_id: String,
    /// Achieved score; `null` when the submitter produced a non-finite
    /// number, coerced to 0 before persistence.
    pub score: Option<f64>,
    /// Time spent on the attempt, in seconds.
    #[serde(default)]
    pub time_taken_seconds: Option<f64>,
    /// Attempt counter; defaults to 1.
    #[serde(default)]
    pub attempts: Option<u32>,
    /// Interaction-defined payload.
    #[serde(default)]
    pub result_data: Value,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// The results ledger.
    pub service: ResultsService,
}

impl AppState {
    /// Creates state over a fresh, empty service.
    #[must_use]
    pub fn new(service: ResultsService) -> Self {
        Self { service }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// A required identity header is absent or unreadable.
    MissingHeader(&'static str),
    /// The submission failed service-side validation.
    InvalidSubmission(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingHeader(name) => format!("missing required header: {name}"),
            Self::InvalidSubmission(message) => message,
        };
        let body = Json(ErrorResponse { error: message });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with the results endpoints.
///
/// Carries permissive CORS (lesson hosts are served from their own origins)
/// and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/interaction-results", post(handle_save_result))
        .route(
            "/interaction-results/average/:interaction_type_id/:lesson_id/:substage_id",
            get(handle_average),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Reads an identity header as UTF-8 text.
fn header_text(headers: &HeaderMap, name: &'static str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Handler for `POST /interaction-results`.
async fn handle_save_result(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SaveResultRequest>,
) -> Result<Json<ResultOutcome>, ApiError> {
    let Some(student_id) = header_text(&headers, "x-user-id") else {
        warn!("result submission without x-user-id header");
        return Err(ApiError::MissingHeader("x-user-id"));
    };
    let tenant_id = header_text(&headers, "x-tenant-id");

    info!(
        student_id = %student_id,
        interaction_type_id = %request.interaction_type_id,
        lesson_id = %request.lesson_id,
        "received interaction result"
    );

    let draft = ResultDraft {
        student_id,
        tenant_id,
        lesson_id: request.lesson_id,
        stage_id: request.stage_id,
        substage_id: request.substage_id,
        interaction_type_id: request.interaction_type_id,
        score: request.score,
        time_taken_seconds: request.time_taken_seconds,
        attempts: request.attempts.unwrap_or(1),
        result_data: request.result_data,
        completed_at: Utc::now(),
    };

    let outcome = state
        .service
        .save_result(draft)
        .await
        .map_err(|e| ApiError::InvalidSubmission(e.to_string()))?;

    Ok(Json(outcome))
}

/// Handler for `GET /interaction-results/average/...`.
///
/// Unknown placements answer with null/zero defaults rather than 404: an
/// interaction with no results yet is a normal state, not an error.
async fn handle_average(
    State(state): State<Arc<AppState>>,
    Path((interaction_type_id, lesson_id, substage_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Json<AverageResponse> {
    let key = InteractionKey {
        interaction_type_id,
        lesson_id,
        substage_id,
        tenant_id: header_text(&headers, "x-tenant-id"),
    };

    let snapshot = state.service.average(&key).await.unwrap_or(AverageSnapshot {
        avg_score: None,
        total_attempts: 0,
        avg_time_seconds: None,
    });
    Json(snapshot)
}

// ============================================================================
// Tests
// ============================================================================
