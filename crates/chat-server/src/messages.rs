//! The `messages` field of a chat request, normalized into typed values.

use completions::{ChatMessage, ContentPart, MessageContent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Text used when an image arrives with an empty user message.
pub const DEFAULT_IMAGE_PROMPT: &str = "What's in this image?";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A message as sent by the browser. Any other fields (such as the
/// front end's `imageUrl`) are dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
}

/// Rejections of the `messages` field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagesError {
    #[error("Messages array required")]
    Missing,

    #[error("Invalid message at index {index}: {reason}")]
    Invalid { index: usize, reason: String },
}

/// A non-empty, ordered conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation(Vec<IncomingMessage>);

impl Conversation {
    /// Accept either a JSON array or a string holding one.
    pub fn from_value(raw: Value) -> Result<Self, MessagesError> {
        let value = match raw {
            Value::String(encoded) => {
                serde_json::from_str(&encoded).map_err(|_| MessagesError::Missing)?
            }
            other => other,
        };

        let Value::Array(items) = value else {
            return Err(MessagesError::Missing);
        };
        if items.is_empty() {
            return Err(MessagesError::Missing);
        }

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|e| MessagesError::Invalid {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Conversation)
    }

    /// Parse the multipart form value.
    pub fn from_encoded(encoded: &str) -> Result<Self, MessagesError> {
        Self::from_value(Value::String(encoded.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Upstream messages carrying only role and text.
    pub fn into_upstream(self) -> Vec<ChatMessage> {
        self.0
            .into_iter()
            .map(|msg| ChatMessage::text(msg.role.as_str(), msg.content.unwrap_or_default()))
            .collect()
    }
}

/// Put an inline image on the most recent user message.
///
/// That message's text becomes a `[text, image_url]` content list. With no
/// user message at all, a new one asking about the image is appended.
pub fn attach_image(messages: &mut Vec<ChatMessage>, mime_type: &str, base64_data: &str) {
    let image = ContentPart::inline_image(mime_type, base64_data);

    let Some(last_user) = messages
        .iter_mut()
        .rev()
        .find(|msg| msg.role == Role::User.as_str())
    else {
        messages.push(ChatMessage {
            role: Role::User.as_str().to_string(),
            content: MessageContent::Parts(vec![ContentPart::text(DEFAULT_IMAGE_PROMPT), image]),
        });
        return;
    };

    // Blank text is replaced; anything else is forwarded as written.
    let text = last_user
        .text_content()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(DEFAULT_IMAGE_PROMPT)
        .to_string();

    last_user.content = MessageContent::Parts(vec![ContentPart::text(text), image]);
}
