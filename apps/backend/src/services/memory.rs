//! In-memory storage used when no database is configured and in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::{DbReviewState, Lesson, NewVocabulary, ReviewFilter, ReviewState, Skill, VocabItem};
use crate::services::store::{LessonStore, ReviewStore};

#[derive(Default)]
struct Tables {
    lessons: HashMap<Uuid, Lesson>,
    vocabulary: HashMap<Uuid, VocabItem>,
    review_states: HashMap<Uuid, DbReviewState>,
}

/// Process-local store. Cloning shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| ApiError::Internal("memory store lock poisoned".to_string()))
    }

    /// Number of stored review states, across all owners.
    pub fn review_state_count(&self) -> Result<usize> {
        Ok(self.tables()?.review_states.len())
    }
}

impl ReviewStore for MemoryStore {
    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>> {
        Ok(self.tables()?.lessons.get(&lesson_id).cloned())
    }

    async fn find_vocabulary(&self, item_id: Uuid) -> Result<Option<VocabItem>> {
        Ok(self.tables()?.vocabulary.get(&item_id).cloned())
    }

    async fn list_vocabulary_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<VocabItem>> {
        let tables = self.tables()?;
        let mut items: Vec<VocabItem> = tables
            .vocabulary
            .values()
            .filter(|v| v.lesson_id == lesson_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)));
        Ok(items)
    }

    async fn find_review_state(
        &self,
        owner: &str,
        item_id: Uuid,
        skill: Skill,
    ) -> Result<Option<DbReviewState>> {
        let tables = self.tables()?;
        Ok(tables
            .review_states
            .values()
            .find(|s| s.owner == owner && s.item_id == item_id && s.skill == skill)
            .cloned())
    }

    async fn create_review_state(
        &self,
        owner: &str,
        item_id: Uuid,
        lesson_id: Uuid,
        skill: Skill,
        defaults: &ReviewState,
    ) -> Result<DbReviewState> {
        let mut tables = self.tables()?;

        if let Some(existing) = tables
            .review_states
            .values()
            .find(|s| s.owner == owner && s.item_id == item_id && s.skill == skill)
        {
            return Ok(existing.clone());
        }

        let state = DbReviewState::from_core_state(owner, item_id, lesson_id, skill, defaults);
        tables.review_states.insert(state.id, state.clone());
        Ok(state)
    }

    async fn update_review_state(
        &self,
        id: Uuid,
        seen_reviews: i32,
        fields: &ReviewState,
    ) -> Result<Option<DbReviewState>> {
        let mut tables = self.tables()?;
        Ok(tables
            .review_states
            .get_mut(&id)
            .filter(|state| state.total_reviews == seen_reviews)
            .map(|state| {
                state.apply(fields);
                state.clone()
            }))
    }

    async fn list_review_states(&self, filter: &ReviewFilter) -> Result<Vec<DbReviewState>> {
        let tables = self.tables()?;
        let mut states: Vec<DbReviewState> = tables
            .review_states
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        states.sort_by(|a, b| {
            a.next_review_at
                .cmp(&b.next_review_at)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(states)
    }
}

impl LessonStore for MemoryStore {
    async fn create_lesson(
        &self,
        title: &str,
        vocabulary: &[NewVocabulary],
    ) -> Result<(Lesson, Vec<VocabItem>)> {
        let mut tables = self.tables()?;
        let lesson = Lesson {
            id: Uuid::new_v4(),
            title: title.to_string(),
            created_at: Utc::now(),
        };

        let items: Vec<VocabItem> = vocabulary
            .iter()
            .enumerate()
            .map(|(position, vocab)| VocabItem::new(lesson.id, vocab, position as i32))
            .collect();

        tables.lessons.insert(lesson.id, lesson.clone());
        for item in &items {
            tables.vocabulary.insert(item.id, item.clone());
        }
        Ok((lesson, items))
    }

    async fn add_vocabulary(&self, lesson_id: Uuid, vocabulary: &NewVocabulary) -> Result<VocabItem> {
        let mut tables = self.tables()?;
        if !tables.lessons.contains_key(&lesson_id) {
            return Err(ApiError::NotFound(format!("Lesson {}", lesson_id)));
        }

        for item in tables.vocabulary.values_mut().filter(|v| v.lesson_id == lesson_id) {
            item.position += 1;
        }
        let item = VocabItem::new(lesson_id, vocabulary, 0);
        tables.vocabulary.insert(item.id, item.clone());
        Ok(item)
    }

    async fn delete_vocabulary(&self, item_id: Uuid) -> Result<bool> {
        let mut tables = self.tables()?;
        let removed = tables.vocabulary.remove(&item_id).is_some();
        tables.review_states.retain(|_, s| s.item_id != item_id);
        Ok(removed)
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> Result<bool> {
        let mut tables = self.tables()?;
        let removed = tables.lessons.remove(&lesson_id).is_some();
        tables.vocabulary.retain(|_, v| v.lesson_id != lesson_id);
        tables.review_states.retain(|_, s| s.lesson_id != lesson_id);
        Ok(removed)
    }
}
