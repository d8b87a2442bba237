//! Message enrichment: flattens each message to plain text, replacing image
//! references with OCR output.
//!
//! Image failures never fail a message. Every image contributes exactly one
//! snippet (its OCR text or a placeholder), in source order.

use std::sync::Arc;

use async_trait::async_trait;
use lmg_protocols::ChatMessage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    content::{normalize, ContentPart},
    error::OcrError,
    media::{ImagePayload, ImageResolver},
};

pub const IMAGE_OCR_MARKER: &str = "[Image OCR]";
pub const OCR_UNREADABLE_PLACEHOLDER: &str = "[OCR could not read the image]";
pub const OCR_EMPTY_PLACEHOLDER: &str = "[OCR returned empty text]";

/// Text extraction from an image payload.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &ImagePayload) -> Result<String, OcrError>;
}

/// A message flattened to a role and plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedMessage {
    pub role: String,
    #[serde(rename = "content")]
    pub text: String,
}

#[derive(Clone)]
pub struct EnrichmentPipeline {
    resolver: Arc<ImageResolver>,
    ocr: Arc<dyn OcrEngine>,
}

impl std::fmt::Debug for EnrichmentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentPipeline")
            .field("resolver", &self.resolver)
            .field("ocr", &"<OcrEngine>")
            .finish()
    }
}

impl EnrichmentPipeline {
    pub fn new(resolver: Arc<ImageResolver>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { resolver, ocr }
    }

    pub async fn enrich(&self, messages: &[ChatMessage]) -> Vec<EnrichedMessage> {
        let mut enriched = Vec::with_capacity(messages.len());
        for message in messages {
            enriched.push(self.enrich_message(message).await);
        }
        enriched
    }

    pub async fn enrich_message(&self, message: &ChatMessage) -> EnrichedMessage {
        let parts = normalize(&message.content);
        let texts: Vec<&str> = parts.iter().filter_map(ContentPart::as_text).collect();

        // Sequential on purpose: snippet order must follow source order.
        let mut ocr_inserts = Vec::new();
        for source in parts.iter().filter_map(ContentPart::as_image_source) {
            ocr_inserts.push(self.ocr_snippet(source).await);
        }

        EnrichedMessage {
            role: message.role().to_string(),
            text: merge_text_and_ocr(&texts, &ocr_inserts),
        }
    }

    async fn ocr_snippet(&self, source: &str) -> String {
        let payload = match self.resolver.resolve(source).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Could not resolve image reference");
                return OCR_UNREADABLE_PLACEHOLDER.to_string();
            }
        };

        match self.ocr.recognize(&payload).await {
            Ok(text) if text.is_empty() => OCR_EMPTY_PLACEHOLDER.to_string(),
            Ok(text) => {
                debug!(chars = text.len(), "OCR extracted text");
                text
            }
            Err(e) => {
                warn!(error = %e, "OCR failed");
                format!("[OCR error: {e}]")
            }
        }
    }
}

/// Join text parts with newlines, then append the OCR section if any.
///
/// With no OCR inserts the result is exactly the newline-joined text.
pub fn merge_text_and_ocr(texts: &[&str], ocr_inserts: &[String]) -> String {
    let mut merged = texts.join("\n");
    if ocr_inserts.is_empty() {
        return merged;
    }
    if !merged.is_empty() {
        merged.push_str("\n\n");
    }
    merged.push_str(IMAGE_OCR_MARKER);
    merged.push('\n');
    merged.push_str(&ocr_inserts.join("\n\n"));
    merged
}
