//! Server configuration, from CLI flags with environment fallbacks.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "crewdeck-server", about = "Slack workspace provisioning and reconciliation")]
pub struct ServerConfig {
    /// Address for the HTTP API.
    #[arg(long, default_value = "127.0.0.1:8080", env = "CREWDECK_ADDR")]
    pub listen_addr: String,

    /// Path to the SQLite project store.
    #[arg(long, default_value = "crewdeck.db", env = "CREWDECK_DB")]
    pub db_path: String,

    /// Slack API base URL. Only changed when pointing at a test double.
    #[arg(long, default_value = "https://slack.com", env = "SLACK_API_URL")]
    pub slack_api_url: String,
}
