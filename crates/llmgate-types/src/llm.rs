//! LLM request/response types for llmgate.
//!
//! These types model the data shapes exchanged between the completion facade
//! and a transport: conversation messages, the outbound chat request, the
//! narrowed response, usage tracking, and error handling.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::config::CompletionModel;

/// Role of a message in an LLM conversation.
///
/// Roles outside the three the core builds itself are carried verbatim in
/// `Other` and left for the transport to accept or reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Other(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Other(role) => role,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match; anything else becomes `Other` unchanged.
impl From<&str> for MessageRole {
    fn from(s: &str) -> Self {
        match s {
            "system" => MessageRole::System,
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => MessageRole::Other(other.to_string()),
        }
    }
}

impl Serialize for MessageRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let role = String::deserialize(deserializer)?;
        Ok(MessageRole::from(role.as_str()))
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Requested shape of the response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Any syntactically valid JSON object.
    JsonObject,
    /// JSON constrained by a JSON Schema document.
    JsonSchema {
        name: String,
        schema: serde_json::Value,
        strict: bool,
    },
}

/// Outbound request handed to a transport.
///
/// Built fresh per call by the facade; never shared between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: CompletionModel,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// The part of a remote completion response the core looks at.
///
/// `content` is the text of the first choice, if the remote returned one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub usage: Usage,
}

/// Token usage for a completion request/response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from completion operations.
///
/// The first group describes a remote call that failed; `Decode` and
/// `Validation` describe a remote call that succeeded with unusable content.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("rate limited")]
    RateLimited,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("response contained no message content")]
    EmptyResponse,

    #[error("response is not valid JSON: {0}")]
    Decode(String),

    #[error("response does not match the requested structure: {0}")]
    Validation(String),
}

impl LlmError {
    /// True when the remote call itself failed, as opposed to returning
    /// content that could not be decoded or validated.
    pub fn is_remote(&self) -> bool {
        !matches!(self, LlmError::Decode(_) | LlmError::Validation(_))
    }
}
