//! # edgequake-doc2text
//!
//! Extract readable, sanitized text from uploaded PDF and plain-text documents.
//!
//! ## Why this crate?
//!
//! A PDF text layer fails in two ways. Sometimes there is none (scans,
//! vector-only exports) and sometimes it is there but broken: the extractor
//! hands back the document's own object syntax or mojibake instead of prose.
//! Feeding either to a language model wastes the prompt. This crate runs a
//! real text extractor first, checks what came out, falls back to recovering
//! text straight from the bytes when needed, and only ever returns text that
//! passed those checks and a normalising sanitizer.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes + media type
//!  │
//!  ├─ 1. Input     size ceiling, media type from declaration / extension / %PDF
//!  ├─ 2. Primary   pdfium text layer, page by page (spawn_blocking)
//!  ├─ 3. Classify  structural indicators + binary ratio
//!  ├─ 4. Fallback  UTF-8 / Windows-1252 / Latin-1 × text objects / printable filter
//!  ├─ 5. Classify  again, on the best fallback candidate
//!  └─ 6. Sanitize  strip controls and BOMs, NFC, collapse whitespace
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2text::{extract_file, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract_file("resume.pdf", &config).await?;
//!     println!("{}", output.text);
//!     eprintln!("via {} ({} chars)",
//!         output.diagnostics.source,
//!         output.diagnostics.character_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2text` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-doc2text = { version = "0.1", default-features = false }
//! ```
//!
//! ## Supplying pdfium
//!
//! The pdfium shared library is bound at runtime, on first use. It is looked
//! up at [`ExtractionConfig::pdfium_library`], then `PDFIUM_LIB_PATH`, then
//! the system library path. If it cannot be bound within
//! [`ExtractionConfig::provider_timeout`] the fallback decoder still runs, and
//! a rejected extraction reports itself as retryable.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{DocumentKey, TextCache};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, DEFAULT_MAX_INPUT_BYTES};
pub use document::{
    CandidateOrigin, ClassificationVerdict, Diagnostics, ExtractionCandidate, ExtractionOutput,
    ExtractionSource, ExtractionState, MediaType, PageToken, RawDocument, SanitizedText,
};
pub use error::{ExtractError, FallbackFailure, PrimaryFailure, ProviderError};
pub use extract::{extract_bytes, extract_file, extract_sync, extract_to_file, Extractor};
pub use pipeline::classify::Classifier;
pub use pipeline::decode::{Encoding, MultiEncodingDecoder};
pub use pipeline::input::load_document;
pub use pipeline::pdfium::PdfiumProvider;
pub use pipeline::primary::{PageTextProvider, ProviderHandle};
pub use pipeline::sanitize::sanitize;
pub use progress::{ExtractionObserver, NoopObserver, ObserverHandle};
