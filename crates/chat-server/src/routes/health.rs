//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
}

/// Health check endpoint; also confirms the user store answers.
pub async fn health(State(state): State<AppState>) -> Result<Json<Health>> {
    database::user::count_users(state.auth.database().pool()).await?;
    Ok(Json(Health {
        status: "ok".to_string(),
    }))
}
