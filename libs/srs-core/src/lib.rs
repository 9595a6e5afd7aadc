//! Core spaced repetition library for vocabulary study.
//!
//! Provides:
//! - SM-2 review algorithm with the 4-point quality scale
//! - Per-skill review state (reading and meaning are scheduled independently)
//! - Statistics aggregation over review states
//! - Study session state machine used by clients to run a round of cards

pub mod algorithm;
pub mod error;
pub mod session;
pub mod stats;
pub mod types;

pub use algorithm::{get_algorithm, SchedulingResult, SpacedRepetitionAlgorithm};
pub use error::{Result, SessionError, SrsError};
pub use session::{LoadOutcome, Phase, RateOutcome, StudySession};
pub use stats::{ReviewStats, ReviewStatus};
pub use types::{Quality, ReviewState, Skill};
