//! Storage collaborator contracts.
//!
//! The scheduler only talks to storage through these traits so that the
//! PostgreSQL database and the in-memory store are interchangeable.

use std::future::Future;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{DbReviewState, Lesson, NewVocabulary, ReviewFilter, ReviewState, Skill, VocabItem};

/// Review state persistence plus read access to lesson vocabulary.
pub trait ReviewStore: Send + Sync + 'static {
    fn find_lesson(&self, lesson_id: Uuid) -> impl Future<Output = Result<Option<Lesson>>> + Send;

    fn find_vocabulary(&self, item_id: Uuid) -> impl Future<Output = Result<Option<VocabItem>>> + Send;

    /// Vocabulary of a lesson in display order.
    fn list_vocabulary_for_lesson(
        &self,
        lesson_id: Uuid,
    ) -> impl Future<Output = Result<Vec<VocabItem>>> + Send;

    fn find_review_state(
        &self,
        owner: &str,
        item_id: Uuid,
        skill: Skill,
    ) -> impl Future<Output = Result<Option<DbReviewState>>> + Send;

    /// Insert a state with the given defaults. When a state for the same
    /// owner, item and skill already exists it is returned unchanged.
    fn create_review_state(
        &self,
        owner: &str,
        item_id: Uuid,
        lesson_id: Uuid,
        skill: Skill,
        defaults: &ReviewState,
    ) -> impl Future<Output = Result<DbReviewState>> + Send;

    /// Overwrite the scheduling fields, but only while the stored row still
    /// has `seen_reviews` total reviews. Returns `None` when the row changed
    /// since it was read or no longer exists.
    fn update_review_state(
        &self,
        id: Uuid,
        seen_reviews: i32,
        fields: &ReviewState,
    ) -> impl Future<Output = Result<Option<DbReviewState>>> + Send;

    /// States matching the filter, ascending by next review time.
    fn list_review_states(
        &self,
        filter: &ReviewFilter,
    ) -> impl Future<Output = Result<Vec<DbReviewState>>> + Send;
}

/// Lesson and vocabulary management.
pub trait LessonStore: Send + Sync + 'static {
    fn create_lesson(
        &self,
        title: &str,
        vocabulary: &[NewVocabulary],
    ) -> impl Future<Output = Result<(Lesson, Vec<VocabItem>)>> + Send;

    /// Insert at the top of the lesson, shifting existing entries down.
    fn add_vocabulary(
        &self,
        lesson_id: Uuid,
        vocabulary: &NewVocabulary,
    ) -> impl Future<Output = Result<VocabItem>> + Send;

    /// Returns false when nothing was deleted. Review states cascade.
    fn delete_vocabulary(&self, item_id: Uuid) -> impl Future<Output = Result<bool>> + Send;

    /// Returns false when nothing was deleted. Vocabulary and review states cascade.
    fn delete_lesson(&self, lesson_id: Uuid) -> impl Future<Output = Result<bool>> + Send;
}
