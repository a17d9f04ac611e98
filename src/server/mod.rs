pub mod handlers;
mod types;

pub use types::{ErrorResponse, FeedbackResponse};

use crate::{
    Result, audio::AudioFetcher, config::Config, feedback::FeedbackGenerator,
    llm::AnthropicClient, storage::FeedbackStorage,
};
use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub async fn run(config: Config) -> Result<()> {
    // Initialize feedback storage
    let db_path =
        std::env::var("FEEDBACK_DB_PATH").unwrap_or_else(|_| config.server.database_path.clone());
    let storage = Arc::new(FeedbackStorage::new(&db_path).await?);

    // One HTTP client for both upstream calls; the configured timeout bounds
    // the audio download and the model invocation alike.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.model.timeout_secs))
        .build()?;

    let model = Arc::new(AnthropicClient::new(http.clone(), config.model.clone()));
    let generator = Arc::new(FeedbackGenerator::new(
        AudioFetcher::new(http),
        model,
        Arc::clone(&storage),
    ));

    let app = router(handlers::AppState { generator, storage });

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: handlers::AppState) -> Router {
    // Permissive CORS: the practice UI is served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/generate-feedback", post(handlers::generate_feedback))
        .route(
            "/sessions/:session_id/feedback",
            get(handlers::session_feedback),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
