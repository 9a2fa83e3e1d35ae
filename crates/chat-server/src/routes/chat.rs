//! Chat proxy: forward a conversation, optionally with an image, upstream.

use axum::async_trait;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::compress::{compress, COMPRESSED_MIME_TYPE};
use crate::error::{AppError, Result};
use crate::messages::{attach_image, Conversation, MessagesError};
use crate::state::AppState;
use crate::upload::ImageUpload;

/// Reply returned to the front end.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// A parsed `/chat` request.
///
/// Multipart bodies carry `messages` as a JSON string plus an optional
/// `image` file; JSON bodies carry `messages` as an array or a string.
#[derive(Debug)]
pub struct ChatForm {
    pub conversation: Conversation,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Deserialize)]
struct ChatJson {
    #[serde(default)]
    messages: Value,
}

#[async_trait]
impl FromRequest<AppState> for ChatForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return read_multipart(multipart, state.config.max_upload_bytes).await;
        }

        let Json(body) = Json::<ChatJson>::from_request(req, state)
            .await
            .map_err(|_| AppError::from(MessagesError::Missing))?;

        Ok(Self {
            conversation: Conversation::from_value(body.messages)?,
            image: None,
        })
    }
}

async fn read_multipart(mut multipart: Multipart, limit: usize) -> Result<ChatForm> {
    let mut messages = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("messages") => {
                messages = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("image") => {
                image = read_image(field, limit).await?;
            }
            other => {
                debug!(field = ?other, "Ignoring unknown form field");
            }
        }
    }

    // Messages are validated before anything touches the disk.
    let encoded = messages.ok_or(MessagesError::Missing)?;
    let conversation = Conversation::from_encoded(&encoded)?;

    Ok(ChatForm {
        conversation,
        image,
    })
}

/// Stream an image field into memory, checking its name before any bytes.
async fn read_image(mut field: Field<'_>, limit: usize) -> Result<Option<ImageUpload>> {
    let name = match field.file_name() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Ok(None),
    };

    let mut upload = ImageUpload::new(name)?;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        upload.push_chunk(&chunk, limit)?;
    }

    Ok(Some(upload))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".to_string())
    } else {
        AppError::Validation(err.body_text())
    }
}

/// Forward the conversation upstream and return the assistant's reply.
pub async fn chat(State(state): State<AppState>, form: ChatForm) -> Result<Json<ChatReply>> {
    let ChatForm {
        conversation,
        image,
    } = form;

    info!(
        message_count = conversation.len(),
        has_image = image.is_some(),
        "Chat request"
    );

    let mut messages = conversation.into_upstream();
    let mut image_url = None;

    if let Some(upload) = image {
        let stored = upload
            .store(&state.config.upload_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        let original_bytes = upload.bytes.len();
        let policy = state.config.compression.clone();
        let original = upload.bytes;
        let compressed = tokio::task::spawn_blocking(move || compress(&original, &policy))
            .await
            .map_err(|e| AppError::Internal(format!("Compression task failed: {}", e)))??;

        info!(
            original_bytes,
            compressed_bytes = compressed.bytes.len(),
            width = compressed.width,
            height = compressed.height,
            passes = compressed.passes,
            "Image compressed"
        );

        attach_image(&mut messages, COMPRESSED_MIME_TYPE, &compressed.to_base64());
        image_url = Some(format!(
            "{}/uploads/{}",
            state.config.public_url, stored.file_name
        ));
    }

    let backend = state.completions.name();
    let reply = state.completions.complete(messages).await?;
    debug!(backend, reply_len = reply.len(), "Upstream replied");

    Ok(Json(ChatReply { reply, image_url }))
}
