use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use podcast_tts::api::routes::{create_router, AppState};
use podcast_tts::config::ServerConfig;
use podcast_tts::tts::{ElevenLabsClient, SpeechService};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("Invalid configuration");

    tracing::info!("Podcast TTS Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", config.addr);
    tracing::info!("Static files: {}", config.static_dir.display());
    tracing::info!("Provider: {}", config.provider.base_url);

    let client = ElevenLabsClient::new(config.provider.clone()).expect("Failed to create client");
    let state = Arc::new(AppState {
        speech: SpeechService::new(client),
    });

    let app = create_router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
