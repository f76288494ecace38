// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use practice_search::config::Config;
use practice_search::routes;
use practice_search::state::AppState;
use practice_search::store::{DocumentStore, SeedDocuments};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store = Arc::new(DocumentStore::new());

    if let Some(path) = &config.seed_file {
        match load_seed_file(path).await {
            Ok(seed) => {
                let loaded = store.load_seed(seed).await;
                tracing::info!("Loaded {} seed documents from {}", loaded, path);
            }
            Err(e) => tracing::error!("Failed to read seed file {}: {}", path, e),
        }
    }

    let state = AppState::new(config.clone(), store);
    if !state.engine.is_available() {
        tracing::warn!("Search backend is not configured; queries will return empty results");
    }

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn load_seed_file(path: &str) -> Result<SeedDocuments, Box<dyn std::error::Error>> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
