//! SM-2 spaced repetition algorithm.
//!
//! Classic SuperMemo 2 update driven by the 4-point quality scale, which is
//! remapped onto SM-2's 0-5 grades before the easiness formula is applied.
//! A grade below `passing_grade` restarts the spacing curve and makes the
//! item due again right away.

use super::{SchedulingResult, SpacedRepetitionAlgorithm};
use crate::types::{Quality, ReviewState};
use chrono::{DateTime, Duration, Utc};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub initial_easiness: f64,
    pub minimum_easiness: f64,
    pub max_interval_days: u32,
    /// Lowest 0-5 grade that counts as a successful recall.
    pub passing_grade: u8,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_easiness: 2.5,
            minimum_easiness: 1.3,
            max_interval_days: 365,
            passing_grade: 3,
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_state(&self, now: DateTime<Utc>) -> ReviewState {
        ReviewState::new(self.initial_easiness, now)
    }

    fn schedule(&self, state: &ReviewState, quality: Quality, now: DateTime<Utc>) -> SchedulingResult {
        let grade = quality.to_sm2_grade();
        let easiness = self.next_easiness(state.easiness_factor, grade);

        let (repetition_count, interval_days) = if grade < self.passing_grade {
            (0, 0)
        } else {
            let repetition_count = state.repetition_count + 1;
            let interval_days = match repetition_count {
                1 => 1,
                2 => 6,
                _ => self.grow_interval(state.interval_days, easiness),
            };
            (repetition_count, interval_days)
        };

        let next_review_at = now + Duration::days(i64::from(interval_days));

        SchedulingResult {
            new_state: ReviewState {
                repetition_count,
                easiness_factor: easiness,
                interval_days,
                next_review_at,
                last_quality: Some(quality),
                total_reviews: state.total_reviews + 1,
                last_reviewed_at: Some(now),
            },
        }
    }
}

impl Sm2 {
    /// E' = E + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at the minimum.
    fn next_easiness(&self, easiness: f64, grade: u8) -> f64 {
        let miss = 5.0 - f64::from(grade);
        let updated = easiness + (0.1 - miss * (0.08 + miss * 0.02));
        updated.max(self.minimum_easiness)
    }

    fn grow_interval(&self, interval_days: u32, easiness: f64) -> u32 {
        let grown = (f64::from(interval_days) * easiness).round();
        if grown >= f64::from(self.max_interval_days) {
            self.max_interval_days
        } else {
            grown as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_QUALITIES: [Quality; 4] = [
        Quality::DidNotKnow,
        Quality::Hard,
        Quality::Good,
        Quality::Easy,
    ];

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn new_item_easy_then_easy_then_good_follows_ladder() {
        let sm2 = Sm2::default();
        let t = now();
        let state = sm2.initial_state(t);

        let first = sm2.schedule(&state, Quality::Easy, t).new_state;
        assert_eq!(first.repetition_count, 1);
        assert_eq!(first.interval_days, 1);
        assert!(first.easiness_factor > 2.5);

        let second = sm2.schedule(&first, Quality::Easy, t).new_state;
        assert_eq!(second.repetition_count, 2);
        assert_eq!(second.interval_days, 6);

        let third = sm2.schedule(&second, Quality::Good, t).new_state;
        assert_eq!(third.repetition_count, 3);
        assert!(third.easiness_factor <= second.easiness_factor);
        assert_eq!(
            third.interval_days,
            (6.0 * third.easiness_factor).round() as u32
        );
        assert_eq!(third.interval_days, 16);
    }

    #[test]
    fn did_not_know_resets_mature_item() {
        let sm2 = Sm2::default();
        let t = now();
        let state = ReviewState {
            repetition_count: 5,
            interval_days: 40,
            easiness_factor: 2.0,
            total_reviews: 9,
            ..ReviewState::new(2.0, t)
        };
        let result = sm2.schedule(&state, Quality::DidNotKnow, t);
        assert_eq!(result.new_state.repetition_count, 0);
        assert_eq!(result.new_state.interval_days, 0);
        assert_eq!(result.new_state.next_review_at, t);
        assert!(result.new_state.easiness_factor < 2.0);
        assert!(close(result.new_state.easiness_factor, 1.3));
        assert_eq!(result.new_state.total_reviews, 10);
    }

    #[test]
    fn hard_resets_and_is_due_now() {
        let sm2 = Sm2::default();
        let t = now();
        let state = ReviewState {
            repetition_count: 2,
            interval_days: 6,
            ..ReviewState::new(2.5, t)
        };
        let result = sm2.schedule(&state, Quality::Hard, t);
        assert_eq!(result.new_state.repetition_count, 0);
        assert!(result.new_state.next_review_at <= t);
        assert!(close(result.new_state.easiness_factor, 2.18));
    }

    #[test]
    fn easiness_deltas_match_formula() {
        let sm2 = Sm2::default();
        let t = now();
        let state = sm2.initial_state(t);
        let deltas = [
            (Quality::DidNotKnow, -0.8),
            (Quality::Hard, -0.32),
            (Quality::Good, 0.0),
            (Quality::Easy, 0.1),
        ];
        for (quality, delta) in deltas {
            let result = sm2.schedule(&state, quality, t);
            assert!(
                close(result.new_state.easiness_factor, 2.5 + delta),
                "{:?} gave {}",
                quality,
                result.new_state.easiness_factor
            );
        }
    }

    #[test]
    fn easiness_never_below_minimum() {
        let sm2 = Sm2::default();
        let t = now();
        for quality in ALL_QUALITIES {
            let mut state = ReviewState::new(1.3, t);
            for _ in 0..10 {
                state = sm2.schedule(&state, quality, t).new_state;
                assert!(state.easiness_factor >= sm2.minimum_easiness);
            }
        }
    }

    #[test]
    fn interval_capped_at_max() {
        let sm2 = Sm2::default();
        let t = now();
        let mut state = sm2.initial_state(t);
        for _ in 0..30 {
            state = sm2.schedule(&state, Quality::Easy, t).new_state;
            assert!(state.interval_days <= 365);
        }
        assert_eq!(state.interval_days, 365);
        assert_eq!(state.next_review_at, t + Duration::days(365));
    }

    #[test]
    fn mixed_sequences_respect_bounds() {
        let sm2 = Sm2::default();
        let t = now();
        let mut state = sm2.initial_state(t);
        // Deterministic walk over every quality in a rotating order
        for step in 0..200usize {
            let quality = ALL_QUALITIES[(step * 7 + step / 3) % 4];
            state = sm2.schedule(&state, quality, t).new_state;
            assert!(state.easiness_factor >= 1.3);
            assert!(state.interval_days <= 365);
            if quality.needs_re_review() {
                assert_eq!(state.repetition_count, 0);
                assert!(state.next_review_at <= t);
            }
        }
        assert_eq!(state.total_reviews, 200);
    }

    #[test]
    fn first_success_after_reset_restarts_ladder() {
        let sm2 = Sm2::default();
        let t = now();
        let state = ReviewState {
            repetition_count: 4,
            interval_days: 30,
            ..ReviewState::new(2.5, t)
        };
        let reset = sm2.schedule(&state, Quality::DidNotKnow, t).new_state;
        let again = sm2.schedule(&reset, Quality::Good, t).new_state;
        assert_eq!(again.repetition_count, 1);
        assert_eq!(again.interval_days, 1);
        let next = sm2.schedule(&again, Quality::Good, t).new_state;
        assert_eq!(next.interval_days, 6);
    }

    #[test]
    fn records_original_quality_and_review_time() {
        let sm2 = Sm2::default();
        let t = now();
        let result = sm2.schedule(&sm2.initial_state(t), Quality::Hard, t);
        assert_eq!(result.new_state.last_quality, Some(Quality::Hard));
        assert_eq!(result.new_state.last_reviewed_at, Some(t));
        assert_eq!(result.new_state.total_reviews, 1);
    }

    #[test]
    fn algorithm_lookup_by_name() {
        assert_eq!(super::super::get_algorithm("sm2").unwrap().name(), "sm2");
        assert!(super::super::get_algorithm("fsrs").is_none());
    }
}
