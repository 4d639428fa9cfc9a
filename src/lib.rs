pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;

use crate::config::IngestConfig;
use crate::services::access_url::AccessUrlIssuer;
use crate::services::ingest::IngestService;
use crate::services::storage::StorageService;
use crate::services::video_repository::VideoRepository;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart framing on top of the video itself
pub const MULTIPART_OVERHEAD: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::videos::create_video,
        api::handlers::videos::list_videos,
        api::handlers::videos::get_video,
        api::handlers::videos::upload_video,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::videos::CreateVideoRequest,
            api::handlers::videos::VideoResponse,
            services::ingest::OrientationCategory,
            services::storage::PresignedAccessUrl,
        )
    ),
    tags(
        (name = "system", description = "Service health"),
        (name = "videos", description = "Video records and ingestion")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub videos: Arc<dyn VideoRepository>,
    pub ingest: Arc<IngestService>,
    pub urls: Arc<AccessUrlIssuer>,
    pub config: IngestConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/videos",
            get(api::handlers::videos::list_videos).post(api::handlers::videos::create_video),
        )
        .route("/videos/:id", get(api::handlers::videos::get_video))
        .route(
            "/videos/:id/upload",
            post(api::handlers::videos::upload_video),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_upload_size.saturating_add(MULTIPART_OVERHEAD),
        ))
        .with_state(state)
}
