//! The results ledger: immutable attempt records plus running averages.
//!
//! All writes go through [`ResultsService::save_result`], which holds the
//! ledger lock across the whole read-modify-write. The incremental mean is
//! not safe under naive concurrent read-then-write, so submissions for the
//! same placement are serialized here; the append-only result insert rides
//! inside the same critical section, which also keeps the percentile scan
//! consistent with the average row.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use crate::average::{percentile_below, sanitize_score, IncrementalAverage};
use crate::{Result, ResultsError};

/// Identity of one averaged placement: interaction type within a lesson
/// substage, optionally scoped to a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractionKey {
    /// Interaction type identifier.
    pub interaction_type_id: String,
    /// Lesson identifier.
    pub lesson_id: String,
    /// Substage identifier.
    pub substage_id: String,
    /// Tenant scope; `None` aggregates across tenants.
    pub tenant_id: Option<String>,
}

/// Input for one result submission.
#[derive(Debug, Clone)]
pub struct ResultDraft {
    /// Submitting student.
    pub student_id: String,
    /// Tenant scope, if any.
    pub tenant_id: Option<String>,
    /// Lesson identifier.
    pub lesson_id: String,
    /// Stage identifier.
    pub stage_id: String,
    /// Substage identifier.
    pub substage_id: String,
    /// Interaction type identifier.
    pub interaction_type_id: String,
    /// Raw wire score; `None` means a non-finite value was submitted.
    pub score: Option<f64>,
    /// Time spent on the attempt, in seconds.
    pub time_taken_seconds: Option<f64>,
    /// Attempt counter reported by the caller.
    pub attempts: u32,
    /// Interaction-defined payload.
    pub result_data: Value,
    /// When the attempt completed.
    pub completed_at: DateTime<Utc>,
}

/// One immutable interaction attempt, as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResult {
    /// Submitting student.
    pub student_id: String,
    /// Tenant scope, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Lesson identifier.
    pub lesson_id: String,
    /// Stage identifier.
    pub stage_id: String,
    /// Substage identifier.
    pub substage_id: String,
    /// Interaction type identifier.
    pub interaction_type_id: String,
    /// Finite score in `[0, 100]`.
    pub score: f64,
    /// Time spent on the attempt, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken_seconds: Option<f64>,
    /// Attempt counter at submission time.
    pub attempts: u32,
    /// Interaction-defined payload.
    pub result_data: Value,
    /// When the attempt completed.
    pub completed_at: DateTime<Utc>,
}

/// What a submission returns to the student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultOutcome {
    /// Whether the result row was persisted.
    pub saved: bool,
    /// The score as persisted (after sanitization).
    pub your_score: f64,
    /// Running class average including this result.
    pub class_average: f64,
    /// Results on file for this placement, including this one.
    pub total_attempts: u64,
    /// Percent of prior results scoring strictly below this one.
    pub percentile: u32,
}

/// Public view of one average row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageSnapshot {
    /// Running mean score, `None` when no results exist.
    pub avg_score: Option<f64>,
    /// Results folded into the row.
    pub total_attempts: u64,
    /// Running mean duration, `None` when no timed results exist.
    pub avg_time_seconds: Option<f64>,
}

#[derive(Debug, Default)]
struct Ledger {
    results: Vec<InteractionResult>,
    averages: HashMap<InteractionKey, IncrementalAverage>,
}

/// Concurrency-safe results store.
///
/// Clones share the same ledger.
#[derive(Debug, Clone, Default)]
pub struct ResultsService {
    ledger: Arc<Mutex<Ledger>>,
}

impl ResultsService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finalized attempt and folds it into the running average.
    ///
    /// The immutable result append never depends on the average update: by
    /// the time the average row is touched the result row is already in the
    /// ledger.
    ///
    /// # Errors
    ///
    /// Returns [`ResultsError::InvalidKey`] when a required identifier is
    /// empty; nothing is persisted in that case.
    pub async fn save_result(&self, draft: ResultDraft) -> Result<ResultOutcome> {
        validate_draft(&draft)?;
        let score = sanitize_score(draft.score);
        let key = InteractionKey {
            interaction_type_id: draft.interaction_type_id.clone(),
            lesson_id: draft.lesson_id.clone(),
            substage_id: draft.substage_id.clone(),
            tenant_id: draft.tenant_id.clone(),
        };

        let mut ledger = self.ledger.lock().await;

        // Percentile ranks against results on file before this submission.
        let prior: Vec<f64> = ledger
            .results
            .iter()
            .filter(|r| result_matches_key(r, &key))
            .map(|r| r.score)
            .collect();
        let percentile = percentile_below(&prior, score);

        ledger.results.push(InteractionResult {
            student_id: draft.student_id,
            tenant_id: draft.tenant_id,
            lesson_id: draft.lesson_id,
            stage_id: draft.stage_id,
            substage_id: draft.substage_id,
            interaction_type_id: draft.interaction_type_id,
            score,
            time_taken_seconds: draft.time_taken_seconds,
            attempts: draft.attempts,
            result_data: draft.result_data,
            completed_at: draft.completed_at,
        });

        let average = ledger.averages.entry(key.clone()).or_default();
        average.observe(score, draft.time_taken_seconds);
        let outcome = ResultOutcome {
            saved: true,
            your_score: score,
            class_average: average.avg_score,
            total_attempts: average.total_attempts,
            percentile,
        };

        info!(
            interaction_type_id = %key.interaction_type_id,
            lesson_id = %key.lesson_id,
            substage_id = %key.substage_id,
            score,
            class_average = outcome.class_average,
            total_attempts = outcome.total_attempts,
            "result recorded"
        );
        Ok(outcome)
    }

    /// Returns the average row for `key`, if any results have been recorded.
    pub async fn average(&self, key: &InteractionKey) -> Option<AverageSnapshot> {
        let ledger = self.ledger.lock().await;
        ledger.averages.get(key).map(|row| AverageSnapshot {
            avg_score: Some(row.avg_score),
            total_attempts: row.total_attempts,
            avg_time_seconds: row.avg_time_seconds,
        })
    }

    /// Total result rows on file, across all placements.
    pub async fn result_count(&self) -> usize {
        self.ledger.lock().await.results.len()
    }
}

fn validate_draft(draft: &ResultDraft) -> Result<()> {
    if draft.student_id.trim().is_empty() {
        return Err(ResultsError::invalid_key("studentId"));
    }
    if draft.lesson_id.trim().is_empty() {
        return Err(ResultsError::invalid_key("lessonId"));
    }
    if draft.substage_id.trim().is_empty() {
        return Err(ResultsError::invalid_key("substageId"));
    }
    if draft.interaction_type_id.trim().is_empty() {
        return Err(ResultsError::invalid_key("interactionTypeId"));
    }
    Ok(())
}

fn result_matches_key(result: &InteractionResult, key: &InteractionKey) -> bool {
    result.interaction_type_id == key.interaction_type_id
        && result.lesson_id == key.lesson_id
        && result.substage_id == key.substage_id
        && result.tenant_id == key.tenant_id
}

// ============================================================================
// Tests
// ============================================================================
