//! Content normalization: turns a message's content into typed parts.

use lmg_protocols::MessageContent;
use serde_json::{Map, Value};

/// One typed fragment of a message's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text { text: String },
    ImageRef { source: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(source: impl Into<String>) -> Self {
        Self::ImageRef {
            source: source.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::ImageRef { .. } => None,
        }
    }

    pub fn as_image_source(&self) -> Option<&str> {
        match self {
            Self::ImageRef { source } => Some(source),
            Self::Text { .. } => None,
        }
    }
}

/// Parse message content into an ordered list of parts.
///
/// Part lists are parsed leniently: entries that are not objects, have an
/// unknown `type`, or carry no usable text/source are skipped. Content that is
/// neither a string nor a list becomes a single text part holding its JSON.
pub fn normalize(content: &MessageContent) -> Vec<ContentPart> {
    match content {
        MessageContent::Text(text) => vec![ContentPart::text(text.clone())],
        MessageContent::Parts(entries) => entries
            .iter()
            .filter_map(Value::as_object)
            .filter_map(parse_part)
            .collect(),
        MessageContent::Opaque(value) => vec![ContentPart::text(value.to_string())],
    }
}

/// The first text part of the content, used as a plain prompt.
pub fn first_text(content: &MessageContent) -> Option<String> {
    normalize(content).into_iter().find_map(|part| match part {
        ContentPart::Text { text } => Some(text),
        ContentPart::ImageRef { .. } => None,
    })
}

fn parse_part(entry: &Map<String, Value>) -> Option<ContentPart> {
    match entry.get("type").and_then(Value::as_str)? {
        "text" | "input_text" => part_text(entry).map(ContentPart::text),
        "image_url" | "input_image" | "image" => image_source(entry).map(ContentPart::image),
        _ => None,
    }
}

fn part_text(entry: &Map<String, Value>) -> Option<&str> {
    ["text", "content"]
        .into_iter()
        .filter_map(|key| entry.get(key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
}

/// `image_url` wins when present (string or `{url}`); `url` is only consulted
/// when there is no `image_url` key at all.
fn image_source(entry: &Map<String, Value>) -> Option<&str> {
    let source = match entry.get("image_url") {
        Some(Value::String(url)) => Some(url.as_str()),
        Some(Value::Object(image_url)) => image_url.get("url").and_then(Value::as_str),
        Some(_) => None,
        None => entry.get("url").and_then(Value::as_str),
    };
    source.filter(|s| !s.is_empty())
}
