use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crewdeck_server::config::ServerConfig;
use crewdeck_server::db::ProjectStore;
use crewdeck_server::web::{AppState, router};
use crewdeck_slack::SlackClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Use JSON logs in production (CREWDECK_LOG_JSON=1), human-readable otherwise
    let json_logs = std::env::var("CREWDECK_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env().add_directive("crewdeck_server=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .init();
    }

    let config = ServerConfig::parse();
    let store = ProjectStore::open(&config.db_path)?;
    tracing::info!(
        "Starting crewdeck server on {} (db: {})",
        config.listen_addr,
        config.db_path
    );

    let state = Arc::new(AppState {
        store: tokio::sync::Mutex::new(store),
        slack: SlackClient::with_base_url(&config.slack_api_url),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
