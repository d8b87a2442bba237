//! OpenAI Chat Completions API types (`/v1/chat/completions`).

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{content::ChatMessage, validated::Normalizable};

pub const CHAT_COMPLETION_OBJECT: &str = "chat.completion";
pub const CHAT_COMPLETION_CHUNK_OBJECT: &str = "chat.completion.chunk";
pub const ASSISTANT_ROLE: &str = "assistant";
pub const FINISH_REASON_STOP: &str = "stop";

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "model is required for /v1/chat/completions"))]
    pub model: String,

    #[serde(default)]
    pub messages: Vec<ChatMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl Normalizable for ChatCompletionRequest {}

impl ChatCompletionRequest {
    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

// ============================================================================
// Non-streaming Response
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

impl ChatCompletionResponse {
    /// A single-choice completion holding `content` as the assistant reply.
    pub fn assistant_reply(
        id: impl Into<String>,
        created: i64,
        model: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            object: CHAT_COMPLETION_OBJECT.to_string(),
            created,
            model: model.into(),
            choices: vec![ChatChoice {
                index: 0,
                message: AssistantMessage {
                    role: ASSISTANT_ROLE.to_string(),
                    content: content.into(),
                },
                finish_reason: Some(FINISH_REASON_STOP.to_string()),
            }],
        }
    }
}

// ============================================================================
// Streaming Chunks
// ============================================================================

/// One `chat.completion.chunk` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChoice {
    pub index: u32,
    pub delta: ChatMessageDelta,
    /// Serialized as `null` on content chunks.
    pub finish_reason: Option<String>,
}

/// Incremental message fields; an empty delta serializes as `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMessageDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    fn single(
        id: &str,
        created: i64,
        model: &str,
        delta: ChatMessageDelta,
        finish_reason: Option<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            object: CHAT_COMPLETION_CHUNK_OBJECT.to_string(),
            created,
            model: model.to_string(),
            choices: vec![ChatStreamChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }

    /// A content delta; `with_role` adds the one-time assistant role marker.
    pub fn content_delta(
        id: &str,
        created: i64,
        model: &str,
        content: &str,
        with_role: bool,
    ) -> Self {
        let delta = ChatMessageDelta {
            role: with_role.then(|| ASSISTANT_ROLE.to_string()),
            content: Some(content.to_string()),
        };
        Self::single(id, created, model, delta, None)
    }

    /// The terminal chunk: empty delta, `finish_reason: "stop"`.
    pub fn stop(id: &str, created: i64, model: &str) -> Self {
        Self::single(
            id,
            created,
            model,
            ChatMessageDelta::default(),
            Some(FINISH_REASON_STOP.to_string()),
        )
    }
}
