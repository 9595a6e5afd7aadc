pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::memory::MemoryStore;
use crate::services::scheduler::Scheduler;
use crate::services::store::{LessonStore, ReviewStore};

/// Shared application state
pub struct AppState<S> {
    pub scheduler: Arc<Scheduler<S>>,
}

impl<S> AppState<S> {
    pub fn new(scheduler: Scheduler<S>) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

/// Build the HTTP router over any store backend.
pub fn router<S: ReviewStore + LessonStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Spaced repetition
        .route("/api/srs/rate-item", post(routes::srs::rate_item::<S>))
        .route("/api/srs/progress", post(routes::srs::progress::<S>))
        .route("/api/srs/due", post(routes::srs::due::<S>))
        .route("/api/srs/stats", post(routes::srs::stats::<S>))
        .route(
            "/api/srs/vocabulary-stats",
            post(routes::srs::vocabulary_stats::<S>),
        )
        // Lessons
        .route("/api/lessons", post(routes::lessons::create::<S>))
        .route("/api/lessons/:id", delete(routes::lessons::delete::<S>))
        .route(
            "/api/lessons/:id/vocabulary",
            post(routes::lessons::add_vocabulary::<S>),
        )
        .route(
            "/api/vocabulary/:id",
            delete(routes::lessons::delete_vocabulary::<S>),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let db = Database::connect(database_url, config.database_max_connections).await?;

            tracing::info!("Running migrations...");
            db.run_migrations().await?;

            router(AppState::new(Scheduler::new(db)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, review state is kept in memory only");
            router(AppState::new(Scheduler::new(MemoryStore::new())))
        }
    };

    let addr = config.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
