//! Inbound message content.
//!
//! Clients send `content` as a plain string, as a list of typed parts, or as
//! anything else JSON allows. The three shapes are kept apart as an explicit
//! variant so consumers never have to inspect raw values to tell them apart.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Role assigned to messages that arrive without one.
pub const DEFAULT_ROLE: &str = "user";

/// Message content as received from the client.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// `"content": "hello"`
    Text(String),
    /// `"content": [{"type": "text", ...}, {"type": "image_url", ...}]`
    ///
    /// Entries are kept raw; malformed entries are skipped later instead of
    /// failing the whole request.
    Parts(Vec<Value>),
    /// Any other JSON value (numbers, objects, `null`, ...).
    Opaque(Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Opaque(Value::Null)
    }
}

impl From<Value> for MessageContent {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Array(parts) => Self::Parts(parts),
            other => Self::Opaque(other),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for MessageContent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Parts(parts) => parts.serialize(serializer),
            Self::Opaque(value) => value.serialize(serializer),
        }
    }
}

/// A single inbound chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            role: Some(role.into()),
            content: content.into(),
        }
    }

    /// The message role, falling back to `"user"` when missing or empty.
    pub fn role(&self) -> &str {
        match self.role.as_deref() {
            Some(role) if !role.is_empty() => role,
            _ => DEFAULT_ROLE,
        }
    }

    /// Build a message from a loosely-typed JSON object.
    ///
    /// A non-string role is treated as missing; a missing content becomes
    /// `MessageContent::Opaque(null)`.
    pub fn from_loose_object(object: &serde_json::Map<String, Value>) -> Self {
        Self {
            role: object
                .get("role")
                .and_then(Value::as_str)
                .map(str::to_string),
            content: object
                .get("content")
                .cloned()
                .map(MessageContent::from)
                .unwrap_or_default(),
        }
    }
}
