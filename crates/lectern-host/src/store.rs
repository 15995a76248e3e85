//! Progress and instance-data stores.
//!
//! Relational persistence lives outside this crate; the router only needs
//! the [`ProgressStore`] seam. [`MemoryStore`] implements it for tests, the
//! demo binary, and hosts that keep session-lifetime progress in memory.
//!
//! Invariants enforced here regardless of backend:
//! - `attempts >= 1` always, increasing by exactly 1 per save/increment
//! - instance data is append-only and read newest-first with a bounded limit
//! - `completed_at` is stamped once on the first completion, never cleared

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use lectern_bridge::protocol::{InstanceDataRecord, ProgressSnapshot};

use crate::error::Result;

/// Identity of one bridge session: who is interacting, with what, where.
///
/// The router is constructed with the context once; content never supplies
/// identity in payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// The signed-in user.
    pub user_id: String,
    /// Tenant scope, if the deployment is multi-tenant.
    pub tenant_id: Option<String>,
    /// Lesson identifier.
    pub lesson_id: String,
    /// Stage identifier.
    pub stage_id: String,
    /// Substage identifier.
    pub substage_id: String,
    /// Interaction type placed at this substage.
    pub interaction_type_id: String,
}

/// Bounds on instance-data history scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Records returned when the caller supplies no limit.
    pub default_history_limit: u32,
    /// Hard cap applied to caller-supplied limits.
    pub max_history_limit: u32,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            default_history_limit: 20,
            max_history_limit: 100,
        }
    }
}

impl StoreLimits {
    /// Resolves a caller-supplied limit against the configured bounds.
    #[must_use]
    pub fn clamp(&self, requested: Option<u32>) -> usize {
        requested
            .unwrap_or(self.default_history_limit)
            .min(self.max_history_limit) as usize
    }
}

/// Durable storage seam for user progress and instance data.
///
/// Scores handed to `save_progress` are already sanitized (finite, in
/// `[0, 100]`); backends persist them as given.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Upserts the progress row: creates with `attempts = 1` or increments,
    /// overwrites score/completion/custom data, stamps `completed_at` once.
    async fn save_progress(
        &self,
        ctx: &SessionContext,
        score: f64,
        completed: bool,
        custom_data: Value,
    ) -> Result<ProgressSnapshot>;

    /// Increments the attempt counter without touching score or completion.
    async fn increment_attempts(&self, ctx: &SessionContext) -> Result<ProgressSnapshot>;

    /// Marks the interaction completed without touching the score.
    async fn mark_completed(&self, ctx: &SessionContext) -> Result<ProgressSnapshot>;

    /// Reads the progress row, if one exists.
    async fn progress(&self, ctx: &SessionContext) -> Result<Option<ProgressSnapshot>>;

    /// Appends one instance-data snapshot.
    async fn append_instance_data(
        &self,
        ctx: &SessionContext,
        data: Value,
    ) -> Result<InstanceDataRecord>;

    /// Reads up to `limit` snapshots, newest first.
    async fn instance_history(
        &self,
        ctx: &SessionContext,
        limit: usize,
    ) -> Result<Vec<InstanceDataRecord>>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// Progress row key: one row per user per interaction placement.
type ProgressKey = (String, String, String, String, String);

/// Instance-data key: placement only; snapshots are not per-user.
type PlacementKey = (String, String, String, String);

fn progress_key(ctx: &SessionContext) -> ProgressKey {
    (
        ctx.user_id.clone(),
        ctx.lesson_id.clone(),
        ctx.stage_id.clone(),
        ctx.substage_id.clone(),
        ctx.interaction_type_id.clone(),
    )
}

fn placement_key(ctx: &SessionContext) -> PlacementKey {
    (
        ctx.lesson_id.clone(),
        ctx.stage_id.clone(),
        ctx.substage_id.clone(),
        ctx.interaction_type_id.clone(),
    )
}

#[derive(Debug, Clone)]
struct ProgressRow {
    score: f64,
    completed: bool,
    attempts: u32,
    custom_data: Value,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl ProgressRow {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            score: 0.0,
            completed: false,
            attempts: 1,
            custom_data: Value::Null,
            completed_at: None,
            updated_at: now,
        }
    }

    fn snapshot(&self, ctx: &SessionContext) -> ProgressSnapshot {
        ProgressSnapshot {
            user_id: ctx.user_id.clone(),
            lesson_id: ctx.lesson_id.clone(),
            stage_id: ctx.stage_id.clone(),
            substage_id: ctx.substage_id.clone(),
            interaction_type_id: ctx.interaction_type_id.clone(),
            score: self.score,
            completed: self.completed,
            attempts: self.attempts,
            custom_data: self.custom_data.clone(),
            completed_at: self.completed_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    progress: HashMap<ProgressKey, ProgressRow>,
    instance_data: HashMap<PlacementKey, Vec<InstanceDataRecord>>,
}

/// In-memory [`ProgressStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn save_progress(
        &self,
        ctx: &SessionContext,
        score: f64,
        completed: bool,
        custom_data: Value,
    ) -> Result<ProgressSnapshot> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let row = inner
            .progress
            .entry(progress_key(ctx))
            .and_modify(|row| row.attempts += 1)
            .or_insert_with(|| ProgressRow::new(now));

        row.score = score;
        row.completed = completed;
        row.custom_data = custom_data;
        row.updated_at = now;
        if row.completed && row.completed_at.is_none() {
            row.completed_at = Some(now);
        }
        Ok(row.snapshot(ctx))
    }

    async fn increment_attempts(&self, ctx: &SessionContext) -> Result<ProgressSnapshot> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let row = inner
            .progress
            .entry(progress_key(ctx))
            .and_modify(|row| {
                row.attempts += 1;
                row.updated_at = now;
            })
            .or_insert_with(|| ProgressRow::new(now));
        Ok(row.snapshot(ctx))
    }

    async fn mark_completed(&self, ctx: &SessionContext) -> Result<ProgressSnapshot> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let row = inner
            .progress
            .entry(progress_key(ctx))
            .or_insert_with(|| ProgressRow::new(now));

        row.completed = true;
        row.updated_at = now;
        if row.completed_at.is_none() {
            row.completed_at = Some(now);
        }
        Ok(row.snapshot(ctx))
    }

    async fn progress(&self, ctx: &SessionContext) -> Result<Option<ProgressSnapshot>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .progress
            .get(&progress_key(ctx))
            .map(|row| row.snapshot(ctx)))
    }

    async fn append_instance_data(
        &self,
        ctx: &SessionContext,
        data: Value,
    ) -> Result<InstanceDataRecord> {
        let record = InstanceDataRecord {
            data,
            recorded_at: Utc::now(),
        };
        let mut inner = self.inner.lock().await;
        inner
            .instance_data
            .entry(placement_key(ctx))
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn instance_history(
        &self,
        ctx: &SessionContext,
        limit: usize,
    ) -> Result<Vec<InstanceDataRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .instance_data
            .get(&placement_key(ctx))
            .map(|records| records.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

// ============================================================================
// Tests
// ============================================================================
