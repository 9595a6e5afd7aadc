//! Error types for srs-core.

use thiserror::Error;

/// Result type alias using SrsError.
pub type Result<T> = std::result::Result<T, SrsError>;

/// Errors raised while validating review input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SrsError {
    #[error("invalid quality rating {0} (must be 0-3)")]
    InvalidQuality(i64),

    #[error("unknown skill: {0} (must be reading or meaning)")]
    UnknownSkill(String),
}

/// Illegal transitions of a study session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no active card")]
    NoActiveCard,

    #[error("answer must be shown before rating")]
    AnswerHidden,

    #[error("session is not waiting for items")]
    NotLoading,

    #[error("round is not complete")]
    RoundNotComplete,
}
