//! Core types for vocabulary review scheduling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SrsError;

/// Skill a vocabulary item is reviewed for.
///
/// Each skill keeps its own review state and due schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Reading,
    Meaning,
}

impl Skill {
    pub const ALL: [Skill; 2] = [Skill::Reading, Skill::Meaning];

    /// Get the skill name as stored and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Meaning => "meaning",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reading" => Some(Self::Reading),
            "meaning" => Some(Self::Meaning),
            _ => None,
        }
    }

    /// Parse from string, rejecting unknown tags.
    pub fn parse(s: &str) -> Result<Self, SrsError> {
        Self::from_str(s).ok_or_else(|| SrsError::UnknownSkill(s.to_string()))
    }
}

impl std::fmt::Display for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Skill {
    type Error = SrsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Learner self-assessment after seeing the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    DidNotKnow,
    Hard,
    Good,
    Easy,
}

impl Quality {
    /// Convert to 4-point numeric value (0-3).
    pub fn to_value(self) -> u8 {
        match self {
            Self::DidNotKnow => 0,
            Self::Hard => 1,
            Self::Good => 2,
            Self::Easy => 3,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::DidNotKnow),
            1 => Some(Self::Hard),
            2 => Some(Self::Good),
            3 => Some(Self::Easy),
            _ => None,
        }
    }

    /// Create from 4-point numeric value, rejecting anything outside 0-3.
    pub fn parse(value: i64) -> Result<Self, SrsError> {
        Self::from_value(value).ok_or(SrsError::InvalidQuality(value))
    }

    /// Map onto the 0-5 scale of the classic SM-2 formula.
    /// 0 -> 0, 1 -> 2, 2 -> 4, 3 -> 5
    pub fn to_sm2_grade(self) -> u8 {
        match self {
            Self::DidNotKnow => 0,
            Self::Hard => 2,
            Self::Good => 4,
            Self::Easy => 5,
        }
    }

    /// Items rated below "good" come back in the same session.
    pub fn needs_re_review(self) -> bool {
        self.to_value() < 2
    }
}

/// Review state of one item for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub repetition_count: u32,
    pub easiness_factor: f64,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_quality: Option<Quality>,
    pub total_reviews: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// Fresh state for an item that has never been reviewed; due immediately.
    pub fn new(easiness_factor: f64, now: DateTime<Utc>) -> Self {
        Self {
            repetition_count: 0,
            easiness_factor,
            interval_days: 0,
            next_review_at: now,
            last_quality: None,
            total_reviews: 0,
            last_reviewed_at: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_round_trips_through_value() {
        for value in 0..=3 {
            let quality = Quality::from_value(value).unwrap();
            assert_eq!(quality.to_value() as i64, value);
        }
    }

    #[test]
    fn quality_rejects_out_of_range() {
        assert_eq!(Quality::parse(-1), Err(SrsError::InvalidQuality(-1)));
        assert_eq!(Quality::parse(4), Err(SrsError::InvalidQuality(4)));
        assert!(Quality::from_value(5).is_none());
    }

    #[test]
    fn quality_maps_to_sm2_grades() {
        assert_eq!(Quality::DidNotKnow.to_sm2_grade(), 0);
        assert_eq!(Quality::Hard.to_sm2_grade(), 2);
        assert_eq!(Quality::Good.to_sm2_grade(), 4);
        assert_eq!(Quality::Easy.to_sm2_grade(), 5);
    }

    #[test]
    fn only_low_ratings_need_re_review() {
        assert!(Quality::DidNotKnow.needs_re_review());
        assert!(Quality::Hard.needs_re_review());
        assert!(!Quality::Good.needs_re_review());
        assert!(!Quality::Easy.needs_re_review());
    }

    #[test]
    fn skill_parses_known_tags() {
        assert_eq!(Skill::parse("reading"), Ok(Skill::Reading));
        assert_eq!(Skill::parse("meaning"), Ok(Skill::Meaning));
        assert_eq!(
            Skill::parse("writing"),
            Err(SrsError::UnknownSkill("writing".to_string()))
        );
    }

    #[test]
    fn stored_skill_tag_converts_or_fails() {
        assert_eq!(Skill::try_from("meaning".to_string()), Ok(Skill::Meaning));
        assert_eq!(
            Skill::try_from("Reading".to_string()),
            Err(SrsError::UnknownSkill("Reading".to_string()))
        );
    }

    #[test]
    fn new_state_is_due_immediately() {
        let now = Utc::now();
        let state = ReviewState::new(2.5, now);
        assert!(state.is_due(now));
        assert_eq!(state.repetition_count, 0);
        assert_eq!(state.interval_days, 0);
        assert!(state.last_quality.is_none());
    }
}
