//! Error types for the edgequake-doc2text library.
//!
//! Three layers of failure are kept apart:
//!
//! * [`ExtractError`] (fatal): the call returns no text. This is the only
//!   type the top-level `extract*` functions return.
//!
//! * [`ProviderError`]: raised by a [`crate::pipeline::primary::PageTextProvider`]
//!   implementation. It never reaches the caller on its own when the fallback
//!   decoder gets a chance to run; it is folded into [`PrimaryFailure`].
//!
//! * [`PrimaryFailure`] / [`FallbackFailure`]: why each strategy of the
//!   orchestrator gave up. Both are carried by [`ExtractError::ExtractionFailed`]
//!   so the caller can tell "try a different file" from "try again later".

use crate::document::ClassificationVerdict;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2text library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Pipeline errors ───────────────────────────────────────────────────
    /// Input is neither a PDF nor plain text.
    #[error("Unsupported media type '{media_type}'\nOnly PDF and plain-text documents can be extracted.")]
    UnsupportedMediaType { media_type: String },

    /// The page text provider did not become ready in time.
    #[error("Page text provider not ready after {timeout_ms}ms: {detail}\nThe service may still be starting; try again.")]
    ProviderUnavailable { timeout_ms: u64, detail: String },

    /// The provider loaded the document but found no text on any page.
    #[error("No text content found. The document might be image-based or corrupted.")]
    EmptyExtraction,

    /// Every strategy was exhausted or rejected by the classifier.
    #[error("Text extraction failed.\nPrimary extractor: {primary}\nFallback decoder: {fallback}")]
    ExtractionFailed {
        primary: PrimaryFailure,
        fallback: FallbackFailure,
    },

    /// The provider could not load the document or one of its pages.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// File exceeds the configured size ceiling.
    #[error("File '{path}' is {size} bytes, above the {limit} byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// In-memory document exceeds the configured size ceiling.
    #[error("Document '{name}' is {size} bytes, above the {limit} byte limit")]
    InputTooLarge { name: String, size: u64, limit: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Whether retrying the same input later could succeed.
    ///
    /// Only readiness of the page text provider is transient; every other
    /// failure needs a different input or configuration.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractError::ProviderUnavailable { .. } => true,
            ExtractError::ExtractionFailed { primary, .. } => {
                matches!(primary, PrimaryFailure::Unavailable { .. })
            }
            _ => false,
        }
    }
}

/// Failure reported by a page text provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider could not be initialised (library missing, worker not started).
    #[error("provider initialisation failed: {0}")]
    Init(String),

    /// The bytes are not a valid document of the declared format.
    #[error("document could not be loaded: {0}")]
    Load(String),

    /// A single page could not be read.
    #[error("page {page}: {detail}")]
    Page { page: usize, detail: String },
}

/// Why the primary extractor's result was not accepted.
#[derive(Debug, Clone, Error)]
pub enum PrimaryFailure {
    #[error("page text provider not ready after {timeout_ms}ms ({detail})")]
    Unavailable { timeout_ms: u64, detail: String },

    #[error("{0}")]
    Provider(ProviderError),

    #[error("no text found; the document may be image-only")]
    Empty,

    #[error(
        "output looks like raw document syntax ({} indicators, {:.1}% binary)",
        .0.indicator_count,
        .0.binary_ratio * 100.0
    )]
    BinaryLike(ClassificationVerdict),
}

impl PrimaryFailure {
    /// Fold an adapter error into the primary-stage cause.
    pub(crate) fn from_error(err: ExtractError) -> Self {
        match err {
            ExtractError::ProviderUnavailable { timeout_ms, detail } => {
                PrimaryFailure::Unavailable { timeout_ms, detail }
            }
            ExtractError::EmptyExtraction => PrimaryFailure::Empty,
            ExtractError::Provider(e) => PrimaryFailure::Provider(e),
            other => PrimaryFailure::Provider(ProviderError::Load(other.to_string())),
        }
    }
}

/// Why the multi-encoding fallback produced nothing acceptable.
#[derive(Debug, Clone, Error)]
pub enum FallbackFailure {
    #[error("no candidate decoding produced any text")]
    NoCandidate,

    #[error("best candidate has {chars} characters (needs more than {min})")]
    TooShort { chars: usize, min: usize },

    #[error(
        "best candidate looks like raw document syntax ({} indicators, {:.1}% binary)",
        .0.indicator_count,
        .0.binary_ratio * 100.0
    )]
    BinaryLike(ClassificationVerdict),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(count: usize, ratio: f64) -> ClassificationVerdict {
        ClassificationVerdict {
            is_binary_like: true,
            indicator_count: count,
            binary_ratio: ratio,
        }
    }

    #[test]
    fn extraction_failed_display_names_both_stages() {
        let e = ExtractError::ExtractionFailed {
            primary: PrimaryFailure::BinaryLike(verdict(7, 0.05)),
            fallback: FallbackFailure::TooShort { chars: 12, min: 50 },
        };
        let msg = e.to_string();
        assert!(msg.contains("7 indicators"), "got: {msg}");
        assert!(msg.contains("5.0% binary"), "got: {msg}");
        assert!(msg.contains("12 characters"), "got: {msg}");
    }

    #[test]
    fn provider_unavailable_is_retryable() {
        let e = ExtractError::ProviderUnavailable {
            timeout_ms: 10_000,
            detail: "still binding".into(),
        };
        assert!(e.is_retryable());
        assert!(e.to_string().contains("10000ms"));
    }

    #[test]
    fn rejection_after_unavailable_provider_is_retryable() {
        let e = ExtractError::ExtractionFailed {
            primary: PrimaryFailure::Unavailable {
                timeout_ms: 50,
                detail: "timeout".into(),
            },
            fallback: FallbackFailure::NoCandidate,
        };
        assert!(e.is_retryable());
    }

    #[test]
    fn empty_and_unsupported_are_not_retryable() {
        assert!(!ExtractError::EmptyExtraction.is_retryable());
        let e = ExtractError::UnsupportedMediaType {
            media_type: "image/png".into(),
        };
        assert!(!e.is_retryable());
        assert!(e.to_string().contains("image/png"));
    }

    #[test]
    fn primary_failure_folds_adapter_errors() {
        assert!(matches!(
            PrimaryFailure::from_error(ExtractError::EmptyExtraction),
            PrimaryFailure::Empty
        ));
        let folded = PrimaryFailure::from_error(ExtractError::Provider(ProviderError::Page {
            page: 2,
            detail: "bad xobject".into(),
        }));
        assert_eq!(folded.to_string(), "page 2: bad xobject");
    }
}
