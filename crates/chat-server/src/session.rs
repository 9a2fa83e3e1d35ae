//! Cookie sessions: who is logged in, and the OAuth CSRF state.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use database::User;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;

/// Session key holding the authenticated user's id.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Session key holding the pending Google OAuth `state` value.
pub const OAUTH_STATE_KEY: &str = "oauth_state";

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "chat_session";

/// Build the session middleware backed by an in-process store.
pub fn session_layer(config: &Config) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    let key = match &config.session_secret {
        Some(secret) => signing_key(secret),
        None => {
            warn!("SESSION_SECRET not set; using a random key, sessions end on restart");
            Key::generate()
        }
    };

    // Browsers only send SameSite=None cookies over HTTPS.
    let same_site = if config.cookie_secure {
        SameSite::None
    } else {
        SameSite::Lax
    };

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.cookie_secure)
        .with_http_only(true)
        .with_same_site(same_site)
        .with_expiry(Expiry::OnInactivity(Duration::days(7)))
        .with_signed(key)
}

/// Stretch an arbitrary secret into a 64-byte cookie signing key.
fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Mark the session as belonging to `user`.
///
/// The session id is rotated to prevent fixation.
pub async fn log_in(session: &Session, user: &User) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID_KEY, &user.id).await?;
    debug!(user_id = %user.id, "Session established");
    Ok(())
}

/// Destroy the session.
pub async fn log_out(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    Ok(())
}

/// The logged-in user, re-loaded from the database on every request.
///
/// Rejects with 401 when there is no session or its user no longer exists.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;

        let user_id: String = session
            .get(SESSION_USER_ID_KEY)
            .await?
            .ok_or_else(not_authenticated)?;

        match state.auth.load_user(&user_id).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(auth::AuthError::UserNotFound) => {
                debug!(user_id = %user_id, "Session refers to a deleted user");
                session.flush().await?;
                Err(not_authenticated())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn not_authenticated() -> AppError {
    AppError::Unauthorized("Not authenticated".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_deterministic() {
        let a = signing_key("secret");
        let b = signing_key("secret");
        let c = signing_key("other");
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
