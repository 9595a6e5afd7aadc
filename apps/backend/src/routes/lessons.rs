//! Lesson and vocabulary endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::ApiJson;
use crate::services::store::{LessonStore, ReviewStore};
use crate::AppState;

/// POST /api/lessons
pub async fn create<S: ReviewStore + LessonStore>(
    State(state): State<AppState<S>>,
    ApiJson(payload): ApiJson<CreateLessonRequest>,
) -> Result<Json<LessonResponse>> {
    payload.validate()?;
    let (lesson, vocabulary) = state
        .scheduler
        .store()
        .create_lesson(payload.title.trim(), &payload.vocabulary)
        .await?;

    tracing::info!(lesson_id = %lesson.id, items = vocabulary.len(), "created lesson");
    Ok(Json(LessonResponse { lesson, vocabulary }))
}

/// POST /api/lessons/:id/vocabulary
pub async fn add_vocabulary<S: ReviewStore + LessonStore>(
    State(state): State<AppState<S>>,
    Path(lesson_id): Path<Uuid>,
    ApiJson(payload): ApiJson<NewVocabulary>,
) -> Result<Json<VocabItem>> {
    payload.validate()?;
    let item = state
        .scheduler
        .store()
        .add_vocabulary(lesson_id, &payload)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/lessons/:id
pub async fn delete<S: ReviewStore + LessonStore>(
    State(state): State<AppState<S>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    if !state.scheduler.store().delete_lesson(lesson_id).await? {
        return Err(ApiError::NotFound(format!("Lesson {}", lesson_id)));
    }
    tracing::info!(%lesson_id, "deleted lesson");
    Ok(Json(DeletedResponse { deleted: true }))
}

/// DELETE /api/vocabulary/:id
pub async fn delete_vocabulary<S: ReviewStore + LessonStore>(
    State(state): State<AppState<S>>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    if !state.scheduler.store().delete_vocabulary(item_id).await? {
        return Err(ApiError::NotFound(format!("Vocabulary item {}", item_id)));
    }
    Ok(Json(DeletedResponse { deleted: true }))
}
