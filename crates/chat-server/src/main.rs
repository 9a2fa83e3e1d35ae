//! Chat backend server.

use std::sync::Arc;

use auth::{AuthService, GoogleOAuth};
use chat_server::{build_router, AppState, Config};
use completions::CompletionsClient;
use database::Database;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting chat server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let completions = CompletionsClient::from_env()?;
    let google = config.google.clone().map(GoogleOAuth::new).transpose()?;

    // Build application state
    let state = AppState::new(
        config.clone(),
        AuthService::new(db.clone()),
        google,
        Arc::new(completions),
    );

    let app = build_router(state);

    // Start server
    info!(addr = %config.addr, "Chat server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Chat server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
