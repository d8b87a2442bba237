//! Re-exports from the lmg-multimodal crate.
//!
//! Content normalization, image resolution and OCR enrichment live in the
//! standalone crate so they can be used without the HTTP server.

pub use lmg_multimodal::*;
