//! Google sign-in: redirect out, then handle the callback.

use auth::AuthError;
use axum::extract::{Query, State};
use axum::response::Redirect;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::session::{log_in, OAUTH_STATE_KEY};
use crate::state::AppState;

/// Query parameters Google appends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Send the browser to Google's consent screen.
pub async fn start(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google login is not configured".to_string()))?;

    let csrf = Uuid::new_v4().to_string();
    session.insert(OAUTH_STATE_KEY, &csrf).await?;

    let url = google.authorize_url(&csrf)?;
    Ok(Redirect::to(&url))
}

/// Finish the OAuth flow and log the account in.
///
/// Provider-side failures and identities that cannot be accepted send the
/// browser back to the front end; a state mismatch is rejected outright.
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google login is not configured".to_string()))?;
    let failure = Redirect::to(&state.config.front_url);

    let expected: Option<String> = session.remove(OAUTH_STATE_KEY).await?;
    match (expected, params.state.as_deref()) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => return Err(AppError::Unauthorized("Invalid OAuth state".to_string())),
    }

    if let Some(error) = params.error {
        warn!(error = %error, "Google sign-in declined");
        return Ok(failure);
    }

    let Some(code) = params.code else {
        return Err(AppError::Validation("Missing authorization code".to_string()));
    };

    let identity = match google.exchange_code(&code).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "Google code exchange failed");
            return Ok(failure);
        }
    };

    let user = match state.auth.find_or_create_federated(&identity).await {
        Ok(user) => user,
        Err(e @ (AuthError::OAuth(_) | AuthError::Conflict(_))) => {
            warn!(error = %e, "Google identity not accepted");
            return Ok(failure);
        }
        Err(e) => return Err(e.into()),
    };
    log_in(&session, &user).await?;

    info!(user_id = %user.id, "User logged in with Google");
    Ok(Redirect::to(&format!("{}/chat", state.config.front_url)))
}
