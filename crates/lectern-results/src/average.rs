//! Incremental mean and percentile arithmetic.
//!
//! The averaging pipeline never rescans history: every new result folds into
//! the running mean in O(1), which is mathematically equivalent (up to the
//! two-decimal rounding applied at each step) to recomputing the mean from
//! the full sequence.

use tracing::warn;

/// Percentile reported when no prior results exist for a placement.
pub const NO_INFORMATION_PERCENTILE: u32 = 50;

/// Rounds to two decimal places, the precision averages are stored at.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Coerces a wire score into a finite value in `[0, 100]`.
///
/// `None` is the wire shadow of `NaN`/`Infinity` (JSON cannot carry them)
/// and coerces to 0, the safe default; finite values outside the range are
/// clamped. Either correction logs a diagnostic so content-side scoring
/// bugs stay visible.
#[must_use]
pub fn sanitize_score(score: Option<f64>) -> f64 {
    match score {
        Some(value) if value.is_finite() => {
            let clamped = value.clamp(0.0, 100.0);
            if (clamped - value).abs() > f64::EPSILON {
                warn!(score = value, "score outside [0, 100]; clamping");
            }
            clamped
        }
        Some(value) => {
            warn!(score = value, "non-finite score; coercing to 0");
            0.0
        }
        None => {
            warn!("missing or non-finite score on the wire; coercing to 0");
            0.0
        }
    }
}

/// Fraction of `prior_scores` strictly below `score`, as a whole percent.
///
/// With no prior results there is no information and the percentile is
/// defined as 50. Ties are not split: a score equal to every prior score
/// ranks at 0 (strict `<` semantics, kept to match the observed behavior of
/// the system this replaces).
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percentile_below(prior_scores: &[f64], score: f64) -> u32 {
    if prior_scores.is_empty() {
        return NO_INFORMATION_PERCENTILE;
    }
    let below = prior_scores.iter().filter(|prior| **prior < score).count();
    ((100.0 * below as f64) / prior_scores.len() as f64).round() as u32
}

/// Running average for one interaction placement.
///
/// `avg_score` stays within `[0, 100]` as long as every contributing score
/// does. The duration mean is tracked over the subset of results that
/// carried a duration, backed by its own sample count, so attempts without
/// timing data do not dilute it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IncrementalAverage {
    /// Results folded into this row.
    pub total_attempts: u64,
    /// Running mean score, rounded to two decimals.
    pub avg_score: f64,
    /// Running mean duration in seconds, when any result carried one.
    pub avg_time_seconds: Option<f64>,
    time_samples: u64,
}

impl IncrementalAverage {
    /// Folds one result into the running averages.
    #[allow(clippy::cast_precision_loss)]
    pub fn observe(&mut self, score: f64, time_taken_seconds: Option<f64>) {
        let n = self.total_attempts as f64;
        self.avg_score = round2((self.avg_score * n + score) / (n + 1.0));
        self.total_attempts += 1;

        if let Some(duration) = time_taken_seconds {
            let m = self.time_samples as f64;
            let prior = self.avg_time_seconds.unwrap_or(0.0);
            self.avg_time_seconds = Some(round2((prior * m + duration) / (m + 1.0)));
            self.time_samples += 1;
        }
    }
}
