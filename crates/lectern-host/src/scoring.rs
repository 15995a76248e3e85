//! Forwarding finalized scores into the averaging pipeline.
//!
//! A saved progress row without a corresponding result record is a
//! consistency bug, so the router forwards every sanitized score through
//! this seam as part of the same logical save. The seam stays narrow on
//! purpose: hosts embedding the results service in-process implement it
//! directly over [`ResultsService`]; split deployments put their REST
//! client behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use lectern_bridge::protocol::ResultSummary;
use lectern_results::{ResultDraft, ResultsService};

use crate::error::{HostError, Result};
use crate::store::SessionContext;

/// One finalized attempt, ready for the averaging pipeline.
#[derive(Debug, Clone)]
pub struct ScoreSubmission {
    /// Sanitized score in `[0, 100]`.
    pub score: f64,
    /// Time spent on the attempt, in seconds.
    pub time_taken_seconds: Option<f64>,
    /// Attempt counter after the progress save.
    pub attempts: u32,
    /// Interaction-defined payload.
    pub result_data: Value,
    /// When the attempt completed.
    pub completed_at: DateTime<Utc>,
}

/// Receives finalized scores from the capability router.
#[async_trait]
pub trait ResultsSink: Send + Sync {
    /// Records one attempt and returns the class statistics.
    async fn record(&self, ctx: &SessionContext, submission: ScoreSubmission)
        -> Result<ResultSummary>;
}

#[async_trait]
impl ResultsSink for ResultsService {
    async fn record(
        &self,
        ctx: &SessionContext,
        submission: ScoreSubmission,
    ) -> Result<ResultSummary> {
        let draft = ResultDraft {
            student_id: ctx.user_id.clone(),
            tenant_id: ctx.tenant_id.clone(),
            lesson_id: ctx.lesson_id.clone(),
            stage_id: ctx.stage_id.clone(),
            substage_id: ctx.substage_id.clone(),
            interaction_type_id: ctx.interaction_type_id.clone(),
            score: Some(submission.score),
            time_taken_seconds: submission.time_taken_seconds,
            attempts: submission.attempts,
            result_data: submission.result_data,
            completed_at: submission.completed_at,
        };
        let outcome = self
            .save_result(draft)
            .await
            .map_err(|e| HostError::results(e.to_string()))?;

        Ok(ResultSummary {
            your_score: outcome.your_score,
            class_average: outcome.class_average,
            total_attempts: outcome.total_attempts,
            percentile: outcome.percentile,
        })
    }
}
