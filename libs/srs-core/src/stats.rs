//! Aggregate statistics over review states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ReviewState;

/// Lesson-level review statistics for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    /// Items with at least one review state, approximated by the larger of
    /// the per-skill state counts.
    pub total_items: usize,
    /// Due reviews across both skills; an item due in both counts twice.
    pub due_items: usize,
    pub average_easiness: f64,
    pub average_reading_quality: f64,
    pub average_meaning_quality: f64,
}

impl Default for ReviewStats {
    fn default() -> Self {
        Self {
            total_items: 0,
            due_items: 0,
            average_easiness: 0.0,
            average_reading_quality: 0.0,
            average_meaning_quality: 0.0,
        }
    }
}

impl ReviewStats {
    /// Aggregate reading and meaning states of a single scope.
    pub fn aggregate(reading: &[ReviewState], meaning: &[ReviewState], now: DateTime<Utc>) -> Self {
        let due = |states: &[ReviewState]| states.iter().filter(|s| s.is_due(now)).count();

        let all_count = reading.len() + meaning.len();
        let average_easiness = if all_count == 0 {
            0.0
        } else {
            reading
                .iter()
                .chain(meaning)
                .map(|s| s.easiness_factor)
                .sum::<f64>()
                / all_count as f64
        };

        Self {
            total_items: reading.len().max(meaning.len()),
            due_items: due(reading) + due(meaning),
            average_easiness,
            average_reading_quality: average_quality(reading),
            average_meaning_quality: average_quality(meaning),
        }
    }
}

/// Mean of recorded qualities on the 0-3 scale; unreviewed states are skipped.
fn average_quality(states: &[ReviewState]) -> f64 {
    let (sum, count) = states
        .iter()
        .filter_map(|s| s.last_quality)
        .fold((0u32, 0u32), |(sum, count), q| (sum + u32::from(q.to_value()), count + 1));

    if count == 0 {
        0.0
    } else {
        f64::from(sum) / f64::from(count)
    }
}

/// Display status of a single review state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewStatus {
    NotReviewed,
    Due,
    Scheduled { days: i64 },
}

impl ReviewStatus {
    pub fn of(state: &ReviewState, now: DateTime<Utc>) -> Self {
        if state.last_quality.is_none() {
            return Self::NotReviewed;
        }
        if state.is_due(now) {
            return Self::Due;
        }
        // Round partial days up so "due tomorrow morning" reads as 1 day
        let seconds = (state.next_review_at - now).num_seconds();
        let days = (seconds + 86_399) / 86_400;
        Self::Scheduled { days }
    }
}
