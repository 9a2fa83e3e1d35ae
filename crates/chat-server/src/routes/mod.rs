//! Route handlers for the chat backend.

pub mod auth;
pub mod chat;
pub mod google;
pub mod health;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::state::AppState;

/// Room for the `messages` field and multipart framing on top of the image.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the router with all routes.
pub fn router(config: &Config) -> Router<AppState> {
    let router = Router::new()
        // Accounts
        .route("/api/register", post(users::register))
        .route("/api/update/:id", put(users::update))
        .route("/api/delete/:id", delete(users::delete))
        // Sessions
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/auth", get(auth::auth_status))
        .route("/api/profile", get(auth::profile))
        // Google sign-in
        .route("/api/auth/google", get(google::start))
        .route("/api/auth/google/callback", get(google::callback))
        // Chat proxy
        .route(
            "/chat",
            post(chat::chat).layer(DefaultBodyLimit::max(
                config.max_upload_bytes + FORM_OVERHEAD_BYTES,
            )),
        )
        // Health check
        .route("/health", get(health::health))
        // Stored images
        .nest_service("/uploads", ServeDir::new(&config.upload_dir));

    match &config.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}
