//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, Result};

// Re-export shared types from srs-core
pub use srs_core::stats::{ReviewStats, ReviewStatus};
pub use srs_core::types::{Quality, ReviewState, Skill};

// === Database Entity Types ===

/// Lesson record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Vocabulary entry extracted from a lesson
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VocabItem {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub word: String,
    pub reading: Option<String>,
    pub meaning: String,
    pub original_form: Option<String>,
    pub conjugation_info: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl VocabItem {
    /// Build a new entry for a lesson at the given display position
    pub fn new(lesson_id: Uuid, vocab: &NewVocabulary, position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            lesson_id,
            word: vocab.word.clone(),
            reading: vocab.reading.clone(),
            meaning: vocab.meaning.clone(),
            original_form: vocab.original_form.clone(),
            conjugation_info: vocab.conjugation_info.clone(),
            position,
            created_at: Utc::now(),
        }
    }

    pub fn to_summary(&self) -> VocabularySummary {
        VocabularySummary {
            id: self.id,
            word: self.word.clone(),
            reading: self.reading.clone(),
            meaning: self.meaning.clone(),
        }
    }
}

/// Review state in PostgreSQL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DbReviewState {
    pub id: Uuid,
    pub owner: String,
    pub item_id: Uuid,
    pub lesson_id: Uuid,
    /// Rows with an unknown skill tag fail to decode instead of being guessed.
    #[sqlx(try_from = "String")]
    pub skill: Skill,
    pub repetition_count: i32,
    pub easiness_factor: f64,
    pub interval_days: i32,
    pub next_review_at: DateTime<Utc>,
    pub last_quality: Option<i16>,
    pub total_reviews: i32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbReviewState {
    /// Create a row from srs-core ReviewState
    pub fn from_core_state(
        owner: &str,
        item_id: Uuid,
        lesson_id: Uuid,
        skill: Skill,
        state: &ReviewState,
    ) -> Self {
        let now = Utc::now();
        let mut row = Self {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            item_id,
            lesson_id,
            skill,
            repetition_count: 0,
            easiness_factor: 0.0,
            interval_days: 0,
            next_review_at: state.next_review_at,
            last_quality: None,
            total_reviews: 0,
            last_reviewed_at: None,
            created_at: now,
            updated_at: now,
        };
        row.apply(state);
        row
    }

    /// Overwrite the scheduling fields with a new state
    pub fn apply(&mut self, state: &ReviewState) {
        self.repetition_count = state.repetition_count as i32;
        self.easiness_factor = state.easiness_factor;
        self.interval_days = state.interval_days as i32;
        self.next_review_at = state.next_review_at;
        self.last_quality = state.last_quality.map(|q| i16::from(q.to_value()));
        self.total_reviews = state.total_reviews as i32;
        self.last_reviewed_at = state.last_reviewed_at;
        self.updated_at = Utc::now();
    }

    /// Convert to srs-core ReviewState
    pub fn to_core_state(&self) -> ReviewState {
        ReviewState {
            repetition_count: self.repetition_count.max(0) as u32,
            easiness_factor: self.easiness_factor,
            interval_days: self.interval_days.max(0) as u32,
            next_review_at: self.next_review_at,
            last_quality: self
                .last_quality
                .and_then(|q| Quality::from_value(i64::from(q))),
            total_reviews: self.total_reviews.max(0) as u32,
            last_reviewed_at: self.last_reviewed_at,
        }
    }

    /// Convert to API item joined with its vocabulary entry
    pub fn to_api_item(&self, vocab: &VocabItem) -> ReviewItem {
        ReviewItem {
            id: self.id,
            item_id: self.item_id,
            lesson_id: self.lesson_id,
            skill: self.skill,
            repetition_count: self.repetition_count,
            easiness_factor: self.easiness_factor,
            interval_days: self.interval_days,
            next_review_at: self.next_review_at,
            last_quality: self.last_quality,
            total_reviews: self.total_reviews,
            last_reviewed_at: self.last_reviewed_at,
            vocabulary: vocab.to_summary(),
        }
    }

    pub fn to_progress(&self, now: DateTime<Utc>) -> SkillProgress {
        SkillProgress {
            quality: self.last_quality,
            repetition_count: self.repetition_count,
            next_review_at: self.next_review_at,
            interval_days: self.interval_days,
            status: ReviewStatus::of(&self.to_core_state(), now),
        }
    }
}

/// Filter for listing review states
#[derive(Debug, Clone)]
pub struct ReviewFilter {
    pub owner: String,
    pub lesson_id: Option<Uuid>,
    pub skill: Skill,
    pub due_before: Option<DateTime<Utc>>,
}

impl ReviewFilter {
    pub fn matches(&self, state: &DbReviewState) -> bool {
        state.owner == self.owner
            && state.skill == self.skill
            && self.lesson_id.map_or(true, |id| state.lesson_id == id)
            && self.due_before.map_or(true, |t| state.next_review_at <= t)
    }
}

// === Validation Helpers ===

fn require_owner(owner: Option<String>) -> Result<String> {
    match owner.map(|o| o.trim().to_string()) {
        Some(o) if !o.is_empty() => Ok(o),
        _ => Err(ApiError::BadRequest("owner is required".to_string())),
    }
}

fn require_id(field: &str, value: Option<String>) -> Result<Uuid> {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))?;
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("{} is not a valid id: {}", field, value)))
}

fn require_skill(skill: Option<String>) -> Result<Skill> {
    let skill = skill.ok_or_else(|| ApiError::BadRequest("skill is required".to_string()))?;
    Ok(Skill::parse(&skill)?)
}

// === API Request/Response Types ===

/// Vocabulary fields shown alongside a review state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularySummary {
    pub id: Uuid,
    pub word: String,
    pub reading: Option<String>,
    pub meaning: String,
}

/// Review state joined with vocabulary details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: Uuid,
    pub item_id: Uuid,
    pub lesson_id: Uuid,
    pub skill: Skill,
    pub repetition_count: i32,
    pub easiness_factor: f64,
    pub interval_days: i32,
    pub next_review_at: DateTime<Utc>,
    pub last_quality: Option<i16>,
    pub total_reviews: i32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub vocabulary: VocabularySummary,
}

// Review types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RateItemRequest {
    pub owner: Option<String>,
    pub item_id: Option<String>,
    pub lesson_id: Option<String>,
    pub skill: Option<String>,
    pub quality: Option<i64>,
}

/// Validated rating submission
#[derive(Debug, Clone)]
pub struct RateItem {
    pub owner: String,
    pub item_id: Uuid,
    pub lesson_id: Uuid,
    pub skill: Skill,
    pub quality: Quality,
}

impl RateItemRequest {
    pub fn validate(self) -> Result<RateItem> {
        let quality = self
            .quality
            .ok_or_else(|| ApiError::BadRequest("quality is required".to_string()))?;
        Ok(RateItem {
            owner: require_owner(self.owner)?,
            item_id: require_id("item_id", self.item_id)?,
            lesson_id: require_id("lesson_id", self.lesson_id)?,
            skill: require_skill(self.skill)?,
            quality: Quality::parse(quality)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateItemResponse {
    pub skill: Skill,
    pub repetition_count: i32,
    pub easiness_factor: f64,
    pub interval_days: i32,
    pub next_review_at: DateTime<Utc>,
    pub last_quality: Option<i16>,
    pub total_reviews: i32,
    pub needs_re_review: bool,
}

impl RateItemResponse {
    pub fn new(state: &DbReviewState, quality: Quality) -> Self {
        Self {
            skill: state.skill,
            repetition_count: state.repetition_count,
            easiness_factor: state.easiness_factor,
            interval_days: state.interval_days,
            next_review_at: state.next_review_at,
            last_quality: state.last_quality,
            total_reviews: state.total_reviews,
            needs_re_review: quality.needs_re_review(),
        }
    }
}

/// Owner and lesson scope shared by the read endpoints
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LessonScopeRequest {
    pub owner: Option<String>,
    pub lesson_id: Option<String>,
}

impl LessonScopeRequest {
    pub fn validate(self) -> Result<(String, Uuid)> {
        Ok((
            require_owner(self.owner)?,
            require_id("lesson_id", self.lesson_id)?,
        ))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProgressRequest {
    pub owner: Option<String>,
    pub lesson_id: Option<String>,
    #[serde(default)]
    pub include_all: bool,
}

impl ProgressRequest {
    pub fn validate(self) -> Result<(String, Uuid, bool)> {
        Ok((
            require_owner(self.owner)?,
            require_id("lesson_id", self.lesson_id)?,
            self.include_all,
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub reading_items: Vec<ReviewItem>,
    pub meaning_items: Vec<ReviewItem>,
    pub stats: ReviewStats,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DueItemsRequest {
    pub owner: Option<String>,
    pub lesson_id: Option<String>,
    pub skill: Option<String>,
}

impl DueItemsRequest {
    pub fn validate(self) -> Result<(String, Uuid, Skill)> {
        Ok((
            require_owner(self.owner)?,
            require_id("lesson_id", self.lesson_id)?,
            require_skill(self.skill)?,
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueItemsResponse {
    pub items: Vec<ReviewItem>,
}

/// Progress of one skill for one vocabulary item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillProgress {
    pub quality: Option<i16>,
    pub repetition_count: i32,
    pub next_review_at: DateTime<Utc>,
    pub interval_days: i32,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyProgress {
    pub id: Uuid,
    pub word: String,
    pub reading: Option<String>,
    pub meaning: String,
    pub reading_progress: Option<SkillProgress>,
    pub meaning_progress: Option<SkillProgress>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VocabularyProgressResponse {
    pub vocabulary: Vec<VocabularyProgress>,
}

// Lesson types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVocabulary {
    pub word: String,
    #[serde(default)]
    pub reading: Option<String>,
    pub meaning: String,
    #[serde(default)]
    pub original_form: Option<String>,
    #[serde(default)]
    pub conjugation_info: Option<String>,
}

impl NewVocabulary {
    pub fn validate(&self) -> Result<()> {
        if self.word.trim().is_empty() || self.meaning.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "word and meaning are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLessonRequest {
    pub title: String,
    #[serde(default)]
    pub vocabulary: Vec<NewVocabulary>,
}

impl CreateLessonRequest {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::BadRequest("title is required".to_string()));
        }
        self.vocabulary.iter().try_for_each(NewVocabulary::validate)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonResponse {
    pub lesson: Lesson,
    pub vocabulary: Vec<VocabItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}
