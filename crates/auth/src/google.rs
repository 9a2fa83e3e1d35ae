//! Google OAuth 2.0 authorization-code flow.

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AuthError, Result};

/// Google's authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google's token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google's OpenID Connect userinfo endpoint.
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const SCOPES: &str = "openid email profile";

/// Google OAuth client configuration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Callback URL registered with Google.
    pub redirect_url: String,
    /// Authorization endpoint.
    pub auth_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Userinfo endpoint.
    pub userinfo_url: String,
}

impl GoogleConfig {
    /// Configuration pointing at Google's production endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    /// Point the token and userinfo endpoints at another base URL.
    pub fn with_endpoint_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.auth_url = format!("{}/o/oauth2/v2/auth", base);
        self.token_url = format!("{}/token", base);
        self.userinfo_url = format!("{}/v1/userinfo", base);
        self
    }
}

/// Identity asserted by Google for a signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleIdentity {
    /// Stable Google account id.
    pub sub: String,
    /// Primary email.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Whether Google has verified the email.
    #[serde(default)]
    pub email_verified: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}

/// Talks to Google's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    client: Client,
    config: GoogleConfig,
}

impl GoogleOAuth {
    /// Create a new OAuth client.
    pub fn new(config: GoogleConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AuthError::OAuth(format!("Failed to create HTTP client: {}", e)))?;

        info!(redirect_url = %config.redirect_url, "Google sign-in enabled");

        Ok(Self { client, config })
    }

    /// URL to send the browser to, carrying the CSRF `state` value.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| AuthError::OAuth(format!("Invalid authorization URL: {}", e)))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for the account's identity.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleIdentity> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenError>(&body).ok() {
                Some(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                None => body,
            };
            return Err(AuthError::OAuth(format!(
                "token exchange failed ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let token: TokenResponse = response.json().await?;
        debug!("Exchanged Google authorization code");

        let identity: GoogleIdentity = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if identity.email.as_deref().map_or(true, str::is_empty) {
            return Err(AuthError::OAuth(
                "Google account did not share an email address".to_string(),
            ));
        }

        Ok(identity)
    }
}
