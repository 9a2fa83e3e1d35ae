//! Application state shared across handlers.

use std::sync::Arc;

use auth::{AuthService, GoogleOAuth};
use completions::CompletionBackend;

use crate::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,
    /// Account verification and management.
    pub auth: AuthService,
    /// Google sign-in, when configured.
    pub google: Option<Arc<GoogleOAuth>>,
    /// Where chat conversations are answered.
    pub completions: Arc<dyn CompletionBackend>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: Config,
        auth: AuthService,
        google: Option<GoogleOAuth>,
        completions: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth,
            google: google.map(Arc::new),
            completions,
        }
    }
}
