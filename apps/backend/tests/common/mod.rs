//! Common test utilities for the API integration tests.
//!
//! Most tests run against the in-memory store. [`TestContext::with_database`]
//! builds the same router over PostgreSQL and needs DATABASE_URL.

pub mod fixtures;

use axum::Router;

use nihongo_srs_backend::db::Database;
use nihongo_srs_backend::models::{Lesson, VocabItem};
use nihongo_srs_backend::services::memory::MemoryStore;
use nihongo_srs_backend::services::scheduler::Scheduler;
use nihongo_srs_backend::services::store::{LessonStore, ReviewStore};
use nihongo_srs_backend::{router, AppState};

/// Store handle plus the router built over it.
pub struct TestContext<S> {
    pub store: S,
    app: Router,
}

impl TestContext<MemoryStore> {
    pub fn new() -> Self {
        Self::from_store(MemoryStore::new())
    }
}

impl TestContext<Database> {
    /// # Panics
    /// Panics if DATABASE_URL is not set or the connection fails.
    pub async fn with_database() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url, 5)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations().await.expect("Failed to run migrations");

        Self::from_store(db)
    }
}

impl<S: ReviewStore + LessonStore + Clone> TestContext<S> {
    fn from_store(store: S) -> Self {
        let app = router(AppState::new(Scheduler::new(store.clone())));
        Self { store, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a lesson with `num_words` sample vocabulary items.
    pub async fn create_lesson(&self, num_words: usize) -> (Lesson, Vec<VocabItem>) {
        let vocabulary: Vec<_> = (0..num_words).map(fixtures::vocabulary).collect();
        self.store
            .create_lesson("Test lesson", &vocabulary)
            .await
            .expect("Failed to create test lesson")
    }

    /// Remove a lesson and, through cascades, its vocabulary and review states.
    pub async fn cleanup_lesson(&self, lesson: &Lesson) {
        let _ = self.store.delete_lesson(lesson.id).await;
    }
}
