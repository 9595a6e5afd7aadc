//! Spaced repetition algorithm implementations.

pub mod sm2;

use crate::types::{Quality, ReviewState};
use chrono::{DateTime, Utc};

/// Result of scheduling an item after review.
#[derive(Debug, Clone)]
pub struct SchedulingResult {
    pub new_state: ReviewState,
}

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate next review state after a review.
    fn schedule(&self, state: &ReviewState, quality: Quality, now: DateTime<Utc>) -> SchedulingResult;

    /// Initial state for an item that has never been reviewed.
    fn initial_state(&self, now: DateTime<Utc>) -> ReviewState;
}

/// Get algorithm by name.
pub fn get_algorithm(name: &str) -> Option<Box<dyn SpacedRepetitionAlgorithm>> {
    match name {
        "sm2" => Some(Box::new(sm2::Sm2::default())),
        _ => None,
    }
}
