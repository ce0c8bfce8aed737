use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use crate::tts::SpeechService;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub speech: SpeechService,
}

/// Pre-flight answers that only advertise `method`.
fn cors_for(method: Method) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([method, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn create_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let api_routes = Router::new()
        .route(
            "/generate-podcast",
            post(handlers::generate_podcast).layer(cors_for(Method::POST)),
        )
        .route(
            "/voices",
            get(handlers::list_voices).layer(cors_for(Method::GET)),
        )
        .route(
            "/voices/:voice_id",
            get(handlers::voice_details).layer(cors_for(Method::GET)),
        )
        .route(
            "/health",
            get(handlers::health).layer(cors_for(Method::GET)),
        );

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
