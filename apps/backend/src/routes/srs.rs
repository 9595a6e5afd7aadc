//! Spaced repetition endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::*;
use crate::routes::ApiJson;
use crate::services::store::ReviewStore;
use crate::AppState;

/// POST /api/srs/rate-item
pub async fn rate_item<S: ReviewStore>(
    State(state): State<AppState<S>>,
    ApiJson(payload): ApiJson<RateItemRequest>,
) -> Result<Json<RateItemResponse>> {
    let rate = payload.validate()?;
    let updated = state.scheduler.submit_rating(&rate).await?;

    Ok(Json(RateItemResponse::new(&updated, rate.quality)))
}

/// POST /api/srs/progress
pub async fn progress<S: ReviewStore>(
    State(state): State<AppState<S>>,
    ApiJson(payload): ApiJson<ProgressRequest>,
) -> Result<Json<ProgressResponse>> {
    let (owner, lesson_id, include_all) = payload.validate()?;
    let progress = state
        .scheduler
        .progress(&owner, lesson_id, include_all)
        .await?;
    Ok(Json(progress))
}

/// POST /api/srs/due
pub async fn due<S: ReviewStore>(
    State(state): State<AppState<S>>,
    ApiJson(payload): ApiJson<DueItemsRequest>,
) -> Result<Json<DueItemsResponse>> {
    let (owner, lesson_id, skill) = payload.validate()?;
    let items = state.scheduler.due_items(&owner, lesson_id, skill).await?;
    Ok(Json(DueItemsResponse { items }))
}

/// POST /api/srs/stats
pub async fn stats<S: ReviewStore>(
    State(state): State<AppState<S>>,
    ApiJson(payload): ApiJson<LessonScopeRequest>,
) -> Result<Json<ReviewStats>> {
    let (owner, lesson_id) = payload.validate()?;
    let stats = state.scheduler.stats(&owner, lesson_id).await?;
    Ok(Json(stats))
}

/// POST /api/srs/vocabulary-stats
pub async fn vocabulary_stats<S: ReviewStore>(
    State(state): State<AppState<S>>,
    ApiJson(payload): ApiJson<LessonScopeRequest>,
) -> Result<Json<VocabularyProgressResponse>> {
    let (owner, lesson_id) = payload.validate()?;
    let vocabulary = state
        .scheduler
        .vocabulary_progress(&owner, lesson_id)
        .await?;
    Ok(Json(VocabularyProgressResponse { vocabulary }))
}
