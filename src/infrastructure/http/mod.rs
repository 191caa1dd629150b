use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::controllers::{audio::AudioController, health};
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;

mod request_id;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Assemble every route of the service
pub fn build_router(
    pool: Arc<DbPool>,
    audio_controller: Arc<AudioController>,
    audio_dir: &Path,
) -> Router {
    let chapter_routes = Router::new()
        .route(
            "/api/chapters/:chapterId/audio",
            post(AudioController::generate_chapter_audio)
                .get(AudioController::get_chapter_audio)
                .delete(AudioController::delete_chapter_audio),
        )
        .route(
            "/api/chapters/:chapterId/audio/jobs",
            get(AudioController::list_chapter_audio_jobs),
        )
        .route(
            "/api/chapters/:chapterId/audio/play",
            post(AudioController::record_play),
        )
        .with_state(audio_controller.clone());

    let book_routes = Router::new()
        .route(
            "/api/books/:bookId/audio",
            post(AudioController::generate_book_audio),
        )
        .with_state(audio_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool)
        .merge(chapter_routes)
        .merge(book_routes)
        .nest_service("/audio", ServeDir::new(audio_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    audio_controller: Arc<AudioController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = build_router(pool, audio_controller, &config.audio_storage_dir);
    if config.is_development() {
        app = app.layer(CorsLayer::permissive());
    }

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
