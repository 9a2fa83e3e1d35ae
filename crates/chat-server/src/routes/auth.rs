//! Session routes: login, logout, session check, profile.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;

use super::users::{PublicUser, UserResponse};
use crate::error::Result;
use crate::session::{log_in, log_out, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: PublicUser,
}

/// Verify credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .auth
        .verify_credentials(&req.email, &req.password)
        .await?;
    log_in(&session, &user).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(UserResponse::new("Logged In!", user)))
}

/// End the session, whether or not one exists.
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    log_out(&session).await?;
    info!("User logged out");
    Ok(Json(MessageResponse {
        message: "Logged out!".to_string(),
    }))
}

/// Report the logged-in user; 401 otherwise.
pub async fn auth_status(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::new("authenticated!!", user))
}

pub async fn profile(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse { user: user.into() })
}
