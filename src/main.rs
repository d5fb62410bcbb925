//! Wellness Chat - streaming health and wellness assistant
//!
//! A Rust backend that keeps a conversation with a remote chat model,
//! trimmed to a small context budget, plus a few static wellness panels.

mod api;
mod config;
mod conversation;
mod llm;
mod runtime;
mod turn;
mod wellness;

use api::{create_router, AppState};
use config::AppConfig;
use llm::{LoggingService, OpenAICompatService};
use runtime::RuntimeManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turn::{TrimPolicy, TurnProcessor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; real environment variables still apply
    let dotenv = dotenvy::dotenv_override();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wellness_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    if let Ok(path) = &dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Completion client
    let service = OpenAICompatService::new(&config.provider)?;
    let client = Arc::new(LoggingService::new(Arc::new(service)));
    tracing::info!(
        model = %config.provider.model,
        base_url = %config.provider.base_url,
        token_budget = config.token_budget,
        timeout_secs = config.turn_timeout.map(|t| t.as_secs()),
        "Completion client ready"
    );

    let processor = TurnProcessor::new(client, TrimPolicy::new(config.token_budget))
        .with_timeout(config.turn_timeout);
    let runtime = Arc::new(RuntimeManager::new(Arc::new(processor)));
    let state = AppState::new(runtime, config.thread_id.as_str());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, thread_id = %config.thread_id, "Wellness chat listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
