//! Review scheduler service.
//!
//! Owns the rate / due / stats operations on top of a [`ReviewStore`].
//! Ratings for one (owner, item, skill) key are serialized through
//! [`KeyedLocks`] within the process. Writes are conditional on the review
//! count that was read, so a rating from another instance forces a retry
//! instead of being overwritten.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use srs_core::algorithm::{sm2::Sm2, SpacedRepetitionAlgorithm};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::locks::KeyedLocks;
use crate::services::store::ReviewStore;

type ReviewKey = (String, Uuid, Skill);

const MAX_RATING_ATTEMPTS: u32 = 5;

pub struct Scheduler<S> {
    store: S,
    algorithm: Box<dyn SpacedRepetitionAlgorithm>,
    locks: KeyedLocks<ReviewKey>,
}

impl<S: ReviewStore> Scheduler<S> {
    pub fn new(store: S) -> Self {
        Self::with_algorithm(store, Box::new(Sm2::default()))
    }

    pub fn with_algorithm(store: S, algorithm: Box<dyn SpacedRepetitionAlgorithm>) -> Self {
        Self {
            store,
            algorithm,
            locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply a quality rating to an item and persist the new state.
    pub async fn submit_rating(&self, rate: &RateItem) -> Result<DbReviewState> {
        let vocab = self.vocabulary_in_lesson(rate.item_id, rate.lesson_id).await?;

        let _guard = self
            .locks
            .lock((rate.owner.clone(), rate.item_id, rate.skill))
            .await;

        // Another server instance may rate the same key between read and write.
        for attempt in 1..=MAX_RATING_ATTEMPTS {
            let now = Utc::now();
            let current = self.get_or_create(&rate.owner, &vocab, rate.skill, now).await?;
            let result = self
                .algorithm
                .schedule(&current.to_core_state(), rate.quality, now);

            let Some(updated) = self
                .store
                .update_review_state(current.id, current.total_reviews, &result.new_state)
                .await?
            else {
                tracing::debug!(item_id = %rate.item_id, attempt, "review state changed concurrently, retrying");
                continue;
            };

            tracing::debug!(
                owner = %rate.owner,
                item_id = %rate.item_id,
                skill = %rate.skill,
                quality = rate.quality.to_value(),
                interval_days = updated.interval_days,
                "rated item"
            );

            return Ok(updated);
        }

        Err(ApiError::Conflict(format!(
            "Review state for item {} kept changing during rating",
            rate.item_id
        )))
    }

    /// Review states of a lesson that are due now, most overdue first.
    /// Items never reviewed have no state and are not returned.
    pub async fn due_items(&self, owner: &str, lesson_id: Uuid, skill: Skill) -> Result<Vec<ReviewItem>> {
        self.require_lesson(lesson_id).await?;
        let vocabulary = self.store.list_vocabulary_for_lesson(lesson_id).await?;

        let states = self
            .store
            .list_review_states(&ReviewFilter {
                owner: owner.to_string(),
                lesson_id: Some(lesson_id),
                skill,
                due_before: Some(Utc::now()),
            })
            .await?;

        Ok(join_vocabulary(&states, &vocabulary))
    }

    /// One review state per vocabulary item of the lesson, creating missing
    /// ones, in vocabulary display order.
    pub async fn all_items_for_lesson(
        &self,
        owner: &str,
        lesson_id: Uuid,
        skill: Skill,
    ) -> Result<Vec<ReviewItem>> {
        self.require_lesson(lesson_id).await?;
        let vocabulary = self.store.list_vocabulary_for_lesson(lesson_id).await?;

        let now = Utc::now();
        let mut items = Vec::with_capacity(vocabulary.len());
        for vocab in &vocabulary {
            let state = self.get_or_create(owner, vocab, skill, now).await?;
            items.push(state.to_api_item(vocab));
        }
        Ok(items)
    }

    /// Lesson statistics over both skills.
    pub async fn stats(&self, owner: &str, lesson_id: Uuid) -> Result<ReviewStats> {
        self.require_lesson(lesson_id).await?;
        let reading = self.lesson_states(owner, lesson_id, Skill::Reading).await?;
        let meaning = self.lesson_states(owner, lesson_id, Skill::Meaning).await?;

        Ok(ReviewStats::aggregate(
            &to_core_states(&reading),
            &to_core_states(&meaning),
            Utc::now(),
        ))
    }

    /// Due items for both skills (or all items when `include_all`) plus stats.
    pub async fn progress(&self, owner: &str, lesson_id: Uuid, include_all: bool) -> Result<ProgressResponse> {
        let (reading_items, meaning_items) = if include_all {
            (
                self.all_items_for_lesson(owner, lesson_id, Skill::Reading).await?,
                self.all_items_for_lesson(owner, lesson_id, Skill::Meaning).await?,
            )
        } else {
            (
                self.due_items(owner, lesson_id, Skill::Reading).await?,
                self.due_items(owner, lesson_id, Skill::Meaning).await?,
            )
        };

        let stats = self.stats(owner, lesson_id).await?;

        Ok(ProgressResponse {
            reading_items,
            meaning_items,
            stats,
        })
    }

    /// Per-item reading and meaning progress, in vocabulary display order.
    pub async fn vocabulary_progress(&self, owner: &str, lesson_id: Uuid) -> Result<Vec<VocabularyProgress>> {
        self.require_lesson(lesson_id).await?;
        let vocabulary = self.store.list_vocabulary_for_lesson(lesson_id).await?;

        let by_item = |states: Vec<DbReviewState>| -> HashMap<Uuid, DbReviewState> {
            states.into_iter().map(|s| (s.item_id, s)).collect()
        };
        let reading = by_item(self.lesson_states(owner, lesson_id, Skill::Reading).await?);
        let meaning = by_item(self.lesson_states(owner, lesson_id, Skill::Meaning).await?);

        let now = Utc::now();
        Ok(vocabulary
            .into_iter()
            .map(|vocab| VocabularyProgress {
                reading_progress: reading.get(&vocab.id).map(|s| s.to_progress(now)),
                meaning_progress: meaning.get(&vocab.id).map(|s| s.to_progress(now)),
                id: vocab.id,
                word: vocab.word,
                reading: vocab.reading,
                meaning: vocab.meaning,
            })
            .collect())
    }

    async fn get_or_create(
        &self,
        owner: &str,
        vocab: &VocabItem,
        skill: Skill,
        now: DateTime<Utc>,
    ) -> Result<DbReviewState> {
        if let Some(state) = self.store.find_review_state(owner, vocab.id, skill).await? {
            return Ok(state);
        }

        let defaults = self.algorithm.initial_state(now);
        self.store
            .create_review_state(owner, vocab.id, vocab.lesson_id, skill, &defaults)
            .await
    }

    async fn lesson_states(&self, owner: &str, lesson_id: Uuid, skill: Skill) -> Result<Vec<DbReviewState>> {
        self.store
            .list_review_states(&ReviewFilter {
                owner: owner.to_string(),
                lesson_id: Some(lesson_id),
                skill,
                due_before: None,
            })
            .await
    }

    async fn require_lesson(&self, lesson_id: Uuid) -> Result<Lesson> {
        self.store
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Lesson {}", lesson_id)))
    }

    async fn vocabulary_in_lesson(&self, item_id: Uuid, lesson_id: Uuid) -> Result<VocabItem> {
        self.require_lesson(lesson_id).await?;
        self.store
            .find_vocabulary(item_id)
            .await?
            .filter(|v| v.lesson_id == lesson_id)
            .ok_or_else(|| {
                ApiError::NotFound(format!("Vocabulary item {} in lesson {}", item_id, lesson_id))
            })
    }
}

fn to_core_states(states: &[DbReviewState]) -> Vec<ReviewState> {
    states.iter().map(DbReviewState::to_core_state).collect()
}

/// Keep state order; states whose vocabulary vanished are skipped.
fn join_vocabulary(states: &[DbReviewState], vocabulary: &[VocabItem]) -> Vec<ReviewItem> {
    let by_id: HashMap<Uuid, &VocabItem> = vocabulary.iter().map(|v| (v.id, v)).collect();
    states
        .iter()
        .filter_map(|s| by_id.get(&s.item_id).map(|v| s.to_api_item(v)))
        .collect()
}
