pub mod content;
pub mod enrichment;
pub mod error;
pub mod media;

pub use content::{first_text, normalize, ContentPart};
pub use enrichment::{
    EnrichedMessage, EnrichmentPipeline, OcrEngine, IMAGE_OCR_MARKER, OCR_EMPTY_PLACEHOLDER,
    OCR_UNREADABLE_PLACEHOLDER,
};
pub use error::{OcrError, ResolutionError};
pub use media::{ImagePayload, ImageResolver, ImageResolverConfig, ImageSource};
