//! Shared harness for router-level tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use auth::{AuthService, GoogleConfig, GoogleOAuth};
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chat_server::{build_router, AppState, Config};
use completions::{async_trait, ChatMessage, CompletionBackend, CompletionsError};
use database::Database;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Backend that records every conversation and answers with a fixed reply.
#[derive(Default)]
pub struct RecordingBackend {
    pub reply: String,
    pub fail: bool,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl RecordingBackend {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for RecordingBackend {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompletionsError> {
        self.calls.lock().unwrap().push(messages);
        if self.fail {
            return Err(CompletionsError::Api {
                status: 503,
                message: "upstream overloaded".to_string(),
            });
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// A router over an in-memory database and a temporary upload directory.
pub struct TestApp {
    pub router: Router,
    pub backend: Arc<RecordingBackend>,
    pub uploads: TempDir,
}

pub struct TestAppBuilder {
    config: Config,
    backend: Arc<RecordingBackend>,
    google: Option<GoogleConfig>,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            config: Config {
                session_secret: Some("integration-test-secret".to_string()),
                ..Config::default()
            },
            backend: RecordingBackend::replying("Hello from the model"),
            google: None,
        }
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

impl TestAppBuilder {
    pub fn backend(mut self, backend: Arc<RecordingBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn config(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn google(mut self, config: GoogleConfig) -> Self {
        self.google = Some(config);
        self
    }

    pub async fn build(mut self) -> TestApp {
        let uploads = TempDir::new().unwrap();
        self.config.upload_dir = uploads.path().to_path_buf();

        let db = Database::in_memory().await.unwrap();
        let google = self.google.map(|c| GoogleOAuth::new(c).unwrap());
        let state = AppState::new(
            self.config,
            AuthService::new(db),
            google,
            self.backend.clone(),
        );

        TestApp {
            router: build_router(state),
            backend: self.backend,
            uploads,
        }
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// The `name=value` pair of the session cookie set by a response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("chat_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register and log in, returning the user JSON and session cookie.
pub async fn logged_in(app: &TestApp, email: &str) -> (Value, String) {
    let response = app
        .send(json_request(
            "POST",
            "/api/register",
            serde_json::json!({"name": "Ada", "email": email, "password": "secret-pass"}),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send(json_request(
            "POST",
            "/api/login",
            serde_json::json!({"email": email, "password": "secret-pass"}),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("login sets a session cookie");
    let body = body_json(response).await;

    (body["user"].clone(), cookie)
}
