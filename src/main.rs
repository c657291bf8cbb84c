mod app;
mod auth;
mod config;
mod db;
mod error;
mod mail;
mod response;
mod state;

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "storefront_auth=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    config.environment.install();
    tracing::info!(env = ?config.environment, base_url = %config.public_base_url, "configuration loaded");

    let state = state::AppState::init(config).await?;
    app::serve(app::build_app(state)).await
}
