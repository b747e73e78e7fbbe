//! Extraction entry points and the fallback orchestrator.
//!
//! [`Extractor`] drives one document through the state machine
//!
//! ```text
//! NotStarted ─▶ PrimaryAttempted ─┬─▶ Accepted
//!                                 └─▶ FallbackAttempted ─┬─▶ Accepted
//!                                                        └─▶ Rejected
//! ```
//!
//! Plain-text uploads skip straight from `NotStarted` to `Accepted`. Every
//! accepted text passed the classifier (except the plain-text bypass) and
//! the sanitizer; a rejected document returns [`ExtractError::ExtractionFailed`]
//! naming why each strategy gave up.
//!
//! The free functions ([`extract_file`], [`extract_bytes`], …) build a
//! pdfium-backed extractor per call. Long-running callers should construct
//! one [`Extractor`] and reuse it so pdfium is bound only once.

use crate::config::ExtractionConfig;
use crate::document::{
    CandidateOrigin, ClassificationVerdict, Diagnostics, ExtractionCandidate, ExtractionOutput,
    ExtractionSource, ExtractionState, MediaType, RawDocument, SanitizedText,
};
use crate::error::{ExtractError, FallbackFailure, PrimaryFailure};
use crate::pipeline::classify::Classifier;
use crate::pipeline::decode::MultiEncodingDecoder;
use crate::pipeline::input;
use crate::pipeline::pdfium::PdfiumProvider;
use crate::pipeline::primary::{extract_primary, PageTextProvider, ProviderHandle};
use crate::pipeline::sanitize::sanitize;
use crate::progress::ExtractionObserver;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Orchestrates primary extraction, fallback decoding and sanitisation.
pub struct Extractor<P: PageTextProvider> {
    config: ExtractionConfig,
    provider: ProviderHandle<P>,
    classifier: Classifier,
    decoder: MultiEncodingDecoder,
}

impl<P: PageTextProvider> Extractor<P> {
    pub fn new(provider: ProviderHandle<P>, config: ExtractionConfig) -> Self {
        Self {
            classifier: Classifier::from_config(&config),
            decoder: MultiEncodingDecoder::from_config(&config),
            config,
            provider,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn provider(&self) -> &ProviderHandle<P> {
        &self.provider
    }

    /// Extract sanitized text from `doc`.
    ///
    /// # Errors
    /// - [`ExtractError::InputTooLarge`] when `doc` exceeds `config.max_input_bytes`
    /// - [`ExtractError::UnsupportedMediaType`] for anything but PDF or plain text
    /// - [`ExtractError::ExtractionFailed`] when both strategies gave up
    /// - [`ExtractError::Internal`] when a blocking task panicked
    pub async fn extract(&self, doc: &RawDocument) -> Result<ExtractionOutput, ExtractError> {
        let start = Instant::now();
        let size = doc.len() as u64;
        if size > self.config.max_input_bytes {
            warn!("{}: {} bytes exceeds the input limit", doc.name(), size);
            return Err(ExtractError::InputTooLarge {
                name: doc.name().to_string(),
                size,
                limit: self.config.max_input_bytes,
            });
        }
        let mut trail = StateTrail::new(doc.name(), self.observer());

        match doc.media_type() {
            MediaType::Other(media_type) => {
                warn!("{}: unsupported media type '{}'", doc.name(), media_type);
                return Err(ExtractError::UnsupportedMediaType {
                    media_type: media_type.clone(),
                });
            }
            MediaType::PlainText => {
                let text = String::from_utf8_lossy(doc.bytes());
                // Verdict is informational only: plain text is trusted.
                let verdict = self.classifier.classify(&text);
                return Ok(self.accept(trail, sanitize(&text), verdict, ExtractionSource::PlainText, None));
            }
            MediaType::Pdf => {}
        }

        // ── Primary ──────────────────────────────────────────────────────
        trail.enter(ExtractionState::PrimaryAttempted);
        let primary = match self.run_primary(doc).await {
            Ok(text) => {
                let verdict = self.classifier.classify(&text);
                if verdict.is_binary_like {
                    warn!(
                        "{}: primary output looks like raw document syntax ({} indicators, ratio {:.3})",
                        doc.name(),
                        verdict.indicator_count,
                        verdict.binary_ratio
                    );
                    PrimaryFailure::BinaryLike(verdict)
                } else {
                    let text = sanitize(&text);
                    if text.is_empty() {
                        PrimaryFailure::Empty
                    } else {
                        info!(
                            "{}: primary extraction accepted ({} chars) in {}ms",
                            doc.name(),
                            text.char_count(),
                            start.elapsed().as_millis()
                        );
                        return Ok(self.accept(trail, text, verdict, ExtractionSource::Primary, None));
                    }
                }
            }
            Err(e) => {
                warn!("{}: primary extraction failed: {}", doc.name(), e);
                PrimaryFailure::from_error(e)
            }
        };

        // ── Fallback ─────────────────────────────────────────────────────
        trail.enter(ExtractionState::FallbackAttempted);
        let fallback = match self.run_fallback(doc).await? {
            Ok(candidate) => {
                let verdict = self.classifier.classify(&candidate.text);
                if verdict.is_binary_like {
                    FallbackFailure::BinaryLike(verdict)
                } else {
                    let text = sanitize(&candidate.text);
                    if text.is_empty() {
                        FallbackFailure::TooShort {
                            chars: 0,
                            min: self.config.min_candidate_chars,
                        }
                    } else {
                        info!(
                            "{}: fallback accepted {} candidate ({} chars) in {}ms",
                            doc.name(),
                            origin_label(&candidate.origin),
                            text.char_count(),
                            start.elapsed().as_millis()
                        );
                        return Ok(self.accept(
                            trail,
                            text,
                            verdict,
                            ExtractionSource::FallbackEncoding,
                            Some(candidate.origin),
                        ));
                    }
                }
            }
            Err(failure) => failure,
        };

        trail.enter(ExtractionState::Rejected);
        warn!(
            "{}: extraction rejected (primary: {}; fallback: {})",
            doc.name(),
            primary,
            fallback
        );
        Err(ExtractError::ExtractionFailed { primary, fallback })
    }

    fn observer(&self) -> Option<&dyn ExtractionObserver> {
        self.config.observer.as_deref()
    }

    async fn run_primary(&self, doc: &RawDocument) -> Result<String, ExtractError> {
        let provider = self.provider.acquire(self.config.provider_timeout).await?;
        let bytes = doc.shared_bytes();
        let observer = self.config.observer.clone();
        tokio::task::spawn_blocking(move || {
            extract_primary(&*provider, &bytes[..], observer.as_deref())
        })
        .await
        .map_err(|e| ExtractError::Internal(format!("primary extraction task failed: {e}")))?
    }

    /// Outer error: the blocking task died. Inner: the decoder found nothing usable.
    async fn run_fallback(
        &self,
        doc: &RawDocument,
    ) -> Result<Result<ExtractionCandidate, FallbackFailure>, ExtractError> {
        let bytes = doc.shared_bytes();
        let decoder = self.decoder.clone();
        let candidates = tokio::task::spawn_blocking(move || decoder.candidates(&bytes[..]))
            .await
            .map_err(|e| ExtractError::Internal(format!("fallback decoding task failed: {e}")))?;

        debug!("{}: {} fallback candidates", doc.name(), candidates.len());
        if let Some(obs) = self.observer() {
            for c in &candidates {
                obs.on_candidate(c);
            }
        }
        Ok(self.decoder.choose(candidates))
    }

    fn accept(
        &self,
        mut trail: StateTrail<'_>,
        text: SanitizedText,
        classification: ClassificationVerdict,
        source: ExtractionSource,
        origin: Option<CandidateOrigin>,
    ) -> ExtractionOutput {
        trail.enter(ExtractionState::Accepted);
        let diagnostics = Diagnostics {
            source,
            character_count: text.char_count(),
            classification,
            origin,
            state_path: trail.into_path(),
        };
        if let Some(obs) = self.observer() {
            obs.on_complete(&diagnostics);
        }
        ExtractionOutput { text, diagnostics }
    }
}

impl Extractor<PdfiumProvider> {
    /// Extractor backed by pdfium, bound on first use from
    /// `config.pdfium_library`, `PDFIUM_LIB_PATH` or the system library.
    pub fn pdfium(config: ExtractionConfig) -> Self {
        let handle = PdfiumProvider::lazy_handle(config.pdfium_library.clone());
        Self::new(handle, config)
    }
}

impl<P: PageTextProvider> std::fmt::Debug for Extractor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("config", &self.config)
            .field("provider", &self.provider)
            .finish()
    }
}

/// States visited during one extraction, reported as they are entered.
struct StateTrail<'a> {
    name: &'a str,
    observer: Option<&'a dyn ExtractionObserver>,
    path: Vec<ExtractionState>,
}

impl<'a> StateTrail<'a> {
    fn new(name: &'a str, observer: Option<&'a dyn ExtractionObserver>) -> Self {
        let mut trail = Self {
            name,
            observer,
            path: Vec::with_capacity(4),
        };
        trail.enter(ExtractionState::NotStarted);
        trail
    }

    fn enter(&mut self, state: ExtractionState) {
        debug!("{}: state → {:?}", self.name, state);
        self.path.push(state);
        if let Some(obs) = self.observer {
            obs.on_state_change(state);
        }
    }

    fn into_path(self) -> Vec<ExtractionState> {
        self.path
    }
}

fn origin_label(origin: &CandidateOrigin) -> String {
    match origin {
        CandidateOrigin::Primary => "primary".to_string(),
        CandidateOrigin::Encoding(e) => format!("printable/{e}"),
        CandidateOrigin::Structural(e) => format!("text-object/{e}"),
    }
}

// ── Convenience entry points ─────────────────────────────────────────────

/// Load a file from disk and extract its text with pdfium.
///
/// The media type comes from the file extension, then the `%PDF` signature.
/// Files above `config.max_input_bytes` are refused before being read.
pub async fn extract_file(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let doc = input::load_document(path, None, config.max_input_bytes).await?;
    Extractor::pdfium(config.clone()).extract(&doc).await
}

/// Extract text from bytes already in memory.
///
/// Byte slices above `config.max_input_bytes` are refused with
/// [`ExtractError::InputTooLarge`].
pub async fn extract_bytes(
    bytes: impl Into<Arc<[u8]>>,
    media_type: MediaType,
    name: impl Into<String>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let doc = RawDocument::new(bytes, media_type, name);
    Extractor::pdfium(config.clone()).extract(&doc).await
}

/// Extract a file and write the sanitized text to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Diagnostics, ExtractError> {
    let output = extract_file(input_path, config).await?;
    write_atomic(output_path.as_ref(), output.text.as_str()).await?;
    Ok(output.diagnostics)
}

/// Write `contents` next to `path` under a temporary name, then rename it into place.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), ExtractError> {
    let write_err = |e: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Synchronous wrapper around [`extract_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_file(path, config))
}
