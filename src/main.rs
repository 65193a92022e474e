//! EventHub server binary.
//!
//! Connects to `PostgreSQL`, runs migrations, wires the services, and
//! serves the HTTP API until Ctrl+C.

use eventhub::assistant::CompletionClient;
use eventhub::clock::SystemClock;
use eventhub::config::Config;
use eventhub::metrics::register_business_metrics;
use eventhub::server::{AppState, build_router};
use eventhub::store::{ChatStore, EventStore, PostgresStore, ProfileStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,eventhub=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(database = %config.database.url, "Configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout))
        .connect(&config.database.url)
        .await?;

    let store = PostgresStore::new(pool, config.database.round_trip_timeout());
    store.migrate().await?;
    tracing::info!("Database migrated");

    register_business_metrics();

    let completion_client = config
        .openai
        .api_key
        .clone()
        .map(|key| CompletionClient::new(key, config.openai.model.clone()));
    if completion_client.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; assistant features run in fallback mode");
    }

    let store = Arc::new(store);
    let event_store: Arc<dyn EventStore> = store.clone();
    let profile_store: Arc<dyn ProfileStore> = store.clone();
    let chat_store: Arc<dyn ChatStore> = store;
    let state = AppState::new(
        event_store,
        profile_store,
        chat_store,
        Arc::new(SystemClock),
        completion_client,
    );
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "EventHub server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
