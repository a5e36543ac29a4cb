mod aggregation;
mod config;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod sources;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::aggregation::Aggregator;
use crate::config::Config;
use crate::matching::build_scorer;
use crate::routes::build_router;
use crate::sources::{configured_sources, http};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobscout API v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client shared by every source adapter
    let client = http::build_client(&config)?;
    let sources = configured_sources(&config, &client);
    info!(
        "Job sources: {}",
        sources
            .iter()
            .map(|s| s.kind().name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let scorer = build_scorer(&config)?;
    info!("Match scorer: {}", scorer.backend());

    let aggregator = Aggregator::new(sources, scorer, config.source_timeout());
    let state = AppState {
        aggregator: Arc::new(aggregator),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
