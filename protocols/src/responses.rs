//! OpenAI Responses API types (`/v1/responses`).
//!
//! Only the subset the gateway relays: a model, a stream flag and the input
//! conversation. The input is accepted under `input` (preferred) or the
//! legacy `messages` key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{content::ChatMessage, validated::Normalizable};

pub const RESPONSE_OBJECT: &str = "response";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResponsesRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "model is required for /v1/responses"))]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Conversation items; only honored when it is a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,

    /// Legacy conversation key, consulted when `input` is not a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
}

impl Normalizable for ResponsesRequest {}

impl ResponsesRequest {
    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Messages from `input`, else from `messages`; non-object entries are skipped.
    pub fn conversation(&self) -> Vec<ChatMessage> {
        let items = match (&self.input, &self.messages) {
            (Some(Value::Array(items)), _) => items,
            (_, Some(Value::Array(items))) => items,
            _ => return Vec::new(),
        };
        items
            .iter()
            .filter_map(Value::as_object)
            .map(ChatMessage::from_loose_object)
            .collect()
    }
}

/// A `response` object; streamed frames carry the same shape with the full
/// text produced so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseObject {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub output: Vec<ResponseOutputItem>,
    pub usage: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseOutputItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub role: String,
    pub content: Vec<ResponseOutputContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseOutputContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ResponseObject {
    pub fn assistant_text(
        id: impl Into<String>,
        created: i64,
        model: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            object: RESPONSE_OBJECT.to_string(),
            created,
            model: model.into(),
            output: vec![ResponseOutputItem {
                item_type: "message".to_string(),
                role: crate::chat::ASSISTANT_ROLE.to_string(),
                content: vec![ResponseOutputContent {
                    content_type: "text".to_string(),
                    text: text.into(),
                }],
            }],
            usage: None,
        }
    }
}
