//! HTTP backend for the vision chat app.
//!
//! Serves session-based authentication (local and Google), account
//! management, image uploads and a chat proxy in front of an
//! OpenAI-compatible completions API.
//!
//! # Example
//!
//! ```rust,ignore
//! use chat_server::{build_router, AppState, Config};
//!
//! let state = AppState::new(config, auth, google, completions);
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod compress;
pub mod config;
pub mod error;
pub mod messages;
pub mod routes;
pub mod session;
pub mod state;
pub mod upload;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::{Config, ConfigError};
pub use error::AppError;
pub use state::AppState;

/// Build the application with middleware and state attached.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    routes::router(&config)
        .layer(session::session_layer(&config))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the front-end origin only.
fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    match config.front_url.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(front_url = %config.front_url, "FRONT_URL is not a valid origin; CORS disabled");
            cors
        }
    }
}
