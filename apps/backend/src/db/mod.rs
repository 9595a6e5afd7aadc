//! PostgreSQL database operations

use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::store::{LessonStore, ReviewStore};

const REVIEW_STATE_COLUMNS: &str = "id, owner, item_id, lesson_id, skill, repetition_count, \
     easiness_factor, interval_days, next_review_at, last_quality, total_reviews, \
     last_reviewed_at, created_at, updated_at";

const VOCABULARY_COLUMNS: &str = "id, lesson_id, word, reading, meaning, original_form, \
     conjugation_info, position, created_at";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }
}

// === Review State Repository ===

impl ReviewStore for Database {
    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, title, created_at
            FROM lessons
            WHERE id = $1
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    async fn find_vocabulary(&self, item_id: Uuid) -> Result<Option<VocabItem>> {
        let item = sqlx::query_as::<_, VocabItem>(&format!(
            "SELECT {} FROM vocabulary WHERE id = $1",
            VOCABULARY_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn list_vocabulary_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<VocabItem>> {
        let items = sqlx::query_as::<_, VocabItem>(&format!(
            "SELECT {} FROM vocabulary WHERE lesson_id = $1 ORDER BY position, created_at",
            VOCABULARY_COLUMNS
        ))
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn find_review_state(
        &self,
        owner: &str,
        item_id: Uuid,
        skill: Skill,
    ) -> Result<Option<DbReviewState>> {
        let state = sqlx::query_as::<_, DbReviewState>(&format!(
            "SELECT {} FROM review_states WHERE owner = $1 AND item_id = $2 AND skill = $3",
            REVIEW_STATE_COLUMNS
        ))
        .bind(owner)
        .bind(item_id)
        .bind(skill.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    async fn create_review_state(
        &self,
        owner: &str,
        item_id: Uuid,
        lesson_id: Uuid,
        skill: Skill,
        defaults: &ReviewState,
    ) -> Result<DbReviewState> {
        let row = DbReviewState::from_core_state(owner, item_id, lesson_id, skill, defaults);

        // A concurrent creator may win the insert; either way the select
        // below returns the single row for this key.
        sqlx::query(
            r#"
            INSERT INTO review_states (id, owner, item_id, lesson_id, skill, repetition_count,
                                       easiness_factor, interval_days, next_review_at,
                                       last_quality, total_reviews, last_reviewed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (owner, item_id, skill) DO NOTHING
            "#,
        )
        .bind(row.id)
        .bind(&row.owner)
        .bind(row.item_id)
        .bind(row.lesson_id)
        .bind(row.skill.as_str())
        .bind(row.repetition_count)
        .bind(row.easiness_factor)
        .bind(row.interval_days)
        .bind(row.next_review_at)
        .bind(row.last_quality)
        .bind(row.total_reviews)
        .bind(row.last_reviewed_at)
        .execute(&self.pool)
        .await?;

        self.find_review_state(owner, item_id, skill)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("Review state for item {} vanished", item_id)))
    }

    async fn update_review_state(
        &self,
        id: Uuid,
        seen_reviews: i32,
        fields: &ReviewState,
    ) -> Result<Option<DbReviewState>> {
        // The review count acts as a row version across server instances.
        let state = sqlx::query_as::<_, DbReviewState>(&format!(
            r#"
            UPDATE review_states SET
                repetition_count = $3,
                easiness_factor = $4,
                interval_days = $5,
                next_review_at = $6,
                last_quality = $7,
                total_reviews = $8,
                last_reviewed_at = $9,
                updated_at = NOW()
            WHERE id = $1 AND total_reviews = $2
            RETURNING {}
            "#,
            REVIEW_STATE_COLUMNS
        ))
        .bind(id)
        .bind(seen_reviews)
        .bind(fields.repetition_count as i32)
        .bind(fields.easiness_factor)
        .bind(fields.interval_days as i32)
        .bind(fields.next_review_at)
        .bind(fields.last_quality.map(|q| i16::from(q.to_value())))
        .bind(fields.total_reviews as i32)
        .bind(fields.last_reviewed_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    async fn list_review_states(&self, filter: &ReviewFilter) -> Result<Vec<DbReviewState>> {
        let states = sqlx::query_as::<_, DbReviewState>(&format!(
            r#"
            SELECT {}
            FROM review_states
            WHERE owner = $1 AND skill = $2
              AND ($3::UUID IS NULL OR lesson_id = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR next_review_at <= $4)
            ORDER BY next_review_at, created_at
            "#,
            REVIEW_STATE_COLUMNS
        ))
        .bind(&filter.owner)
        .bind(filter.skill.as_str())
        .bind(filter.lesson_id)
        .bind(filter.due_before)
        .fetch_all(&self.pool)
        .await?;

        Ok(states)
    }
}

// === Lesson Repository ===

impl LessonStore for Database {
    async fn create_lesson(
        &self,
        title: &str,
        vocabulary: &[NewVocabulary],
    ) -> Result<(Lesson, Vec<VocabItem>)> {
        let mut tx = self.pool.begin().await?;

        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            INSERT INTO lessons (title)
            VALUES ($1)
            RETURNING id, title, created_at
            "#,
        )
        .bind(title)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(vocabulary.len());
        for (position, vocab) in vocabulary.iter().enumerate() {
            let item = insert_vocabulary(&mut tx, lesson.id, vocab, position as i32).await?;
            items.push(item);
        }

        tx.commit().await?;
        Ok((lesson, items))
    }

    async fn add_vocabulary(&self, lesson_id: Uuid, vocabulary: &NewVocabulary) -> Result<VocabItem> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM lessons WHERE id = $1)")
            .bind(lesson_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(ApiError::NotFound(format!("Lesson {}", lesson_id)));
        }

        sqlx::query("UPDATE vocabulary SET position = position + 1 WHERE lesson_id = $1")
            .bind(lesson_id)
            .execute(&mut *tx)
            .await?;

        let item = insert_vocabulary(&mut tx, lesson_id, vocabulary, 0).await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn delete_vocabulary(&self, item_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vocabulary WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_vocabulary(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    lesson_id: Uuid,
    vocab: &NewVocabulary,
    position: i32,
) -> Result<VocabItem> {
    let item = sqlx::query_as::<_, VocabItem>(&format!(
        r#"
        INSERT INTO vocabulary (lesson_id, word, reading, meaning, original_form,
                                conjugation_info, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        VOCABULARY_COLUMNS
    ))
    .bind(lesson_id)
    .bind(&vocab.word)
    .bind(&vocab.reading)
    .bind(&vocab.meaning)
    .bind(&vocab.original_form)
    .bind(&vocab.conjugation_info)
    .bind(position)
    .fetch_one(&mut **tx)
    .await?;

    Ok(item)
}
