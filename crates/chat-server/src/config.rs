//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use auth::GoogleConfig;

use crate::compress::CompressionPolicy;

/// Default upload limit for a single image (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Chat server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Secret the session cookie is signed with; random per process when unset.
    pub session_secret: Option<String>,
    /// Mark the session cookie `Secure` and `SameSite=None`.
    pub cookie_secure: bool,
    /// Front-end origin, used for CORS and post-login redirects.
    pub front_url: String,
    /// Public base URL of this server, used in image links.
    pub public_url: String,
    /// Google sign-in, when client credentials are present.
    pub google: Option<GoogleConfig>,
    /// Directory uploaded images are written to and served from.
    pub upload_dir: PathBuf,
    /// Largest accepted image upload in bytes.
    pub max_upload_bytes: usize,
    /// Image compression thresholds.
    pub compression: CompressionPolicy,
    /// Optional directory with a built front-end bundle.
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database_url: "sqlite:chat.db?mode=rwc".to_string(),
            session_secret: None,
            cookie_secure: false,
            front_url: "http://localhost:3000".to_string(),
            public_url: "http://localhost:5000".to_string(),
            google: None,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            compression: CompressionPolicy::default(),
            static_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `SERVER_ADDR` | Server bind address | `127.0.0.1:5000` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:chat.db?mode=rwc` |
    /// | `SESSION_SECRET` | Session cookie signing secret | random |
    /// | `SESSION_COOKIE_SECURE` | Secure, cross-site cookies | `false` |
    /// | `FRONT_URL` | Front-end origin | `http://localhost:3000` |
    /// | `BACK_URL` | Public URL of this server | `http://localhost:5000` |
    /// | `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` | Google sign-in | disabled |
    /// | `GOOGLE_REDIRECT_URL` | OAuth callback | `$BACK_URL/api/auth/google/callback` |
    /// | `UPLOAD_DIR` | Image directory | `uploads` |
    /// | `MAX_UPLOAD_BYTES` | Upload limit | 10 MiB |
    /// | `IMAGE_MAX_BYTES` | Compressed image cap | 4 MiB |
    /// | `STATIC_DIR` | Front-end bundle | unset |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let addr = match env::var("SERVER_ADDR") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidAddr(value))?,
            Err(_) => defaults.addr,
        };

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let session_secret = env::var("SESSION_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty());

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let front_url = trim_url(env::var("FRONT_URL").unwrap_or(defaults.front_url));
        let public_url = trim_url(env::var("BACK_URL").unwrap_or(defaults.public_url));

        let google = match (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_CLIENT_SECRET")) {
            (Ok(id), Ok(secret)) if !id.is_empty() && !secret.is_empty() => {
                let redirect = env::var("GOOGLE_REDIRECT_URL")
                    .unwrap_or_else(|_| format!("{}/api/auth/google/callback", public_url));
                Some(GoogleConfig::new(id, secret, redirect))
            }
            _ => None,
        };

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);

        let max_upload_bytes = parse_bytes("MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes);

        let mut compression = defaults.compression;
        if let Some(cap) = parse_bytes("IMAGE_MAX_BYTES")? {
            compression.max_bytes = cap;
        }

        let static_dir = env::var("STATIC_DIR").ok().map(PathBuf::from);

        Ok(Self {
            addr,
            database_url,
            session_secret,
            cookie_secure,
            front_url,
            public_url,
            google,
            upload_dir,
            max_upload_bytes,
            compression,
            static_dir,
        })
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_bytes(var: &'static str) -> Result<Option<usize>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid SERVER_ADDR: {0}")]
    InvalidAddr(String),

    #[error("{var} must be a byte count, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}
