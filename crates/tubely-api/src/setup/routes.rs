//! Route configuration and setup

use crate::error::expose_error_details;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tubely_core::{Config, StorageBackend};
use tubely_storage::factory::LOCAL_OBJECTS_ROUTE;
use utoipa::OpenApi;

/// Build the application router over a ready [`AppState`].
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();
    let cors = setup_cors(&config);

    let http_concurrency_limit = config.http_concurrency_limit();
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let mut app = api_routes(&config)
        .route("/health", get(handlers::health::health_check))
        .with_state(state)
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .nest_service("/assets", ServeDir::new(config.assets_root()));

    if config.storage_backend() == StorageBackend::Local {
        if let Some(path) = config.local_storage_path() {
            app = app.nest_service(LOCAL_OBJECTS_ROUTE, ServeDir::new(path));
        }
    }

    app.layer(middleware::map_response_with_state(
        config.clone(),
        expose_error_details,
    ))
    .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}

/// Upload endpoints, each with its own body ceiling.
fn api_routes(config: &Config) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(handlers::thumbnail_upload::upload_thumbnail)
                .layer(DefaultBodyLimit::max(config.max_thumbnail_size_bytes())),
        )
        .route(
            "/api/video_upload/{video_id}",
            post(handlers::video_upload::upload_video)
                .layer(DefaultBodyLimit::max(config.max_video_size_bytes())),
        )
}

fn setup_cors(config: &Config) -> CorsLayer {
    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins().iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}
