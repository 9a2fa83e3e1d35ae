//! Account routes: register, update, delete.

use auth::{Registration, UserPatch};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::User;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

/// User as the front end sees it.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// A message alongside the affected user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: PublicUser,
}

impl UserResponse {
    pub fn new(message: &str, user: User) -> Self {
        Self {
            message: message.to_string(),
            user: user.into(),
        }
    }
}

/// Registration form. Missing fields are treated as empty and fail validation.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Create a local account.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new("User Saved Successfully!", user)),
    ))
}

/// Apply a partial update to an account.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .auth
        .update_user(
            &id,
            UserPatch {
                name: req.name,
                email: req.email,
                password: req.password,
            },
        )
        .await?;

    Ok(Json(UserResponse::new("User Updated Successfully!", user)))
}

/// Remove an account.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user = state.auth.delete_user(&id).await?;
    Ok(Json(UserResponse::new("User Deleted Successfully!", user)))
}
