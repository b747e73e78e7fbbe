//! Configuration types for document text extraction.
//!
//! Every threshold the pipeline uses lives in [`ExtractionConfig`], built via
//! its [`ExtractionConfigBuilder`]. None of the numbers below are hard-coded
//! anywhere else in the crate.

use crate::error::ExtractError;
use crate::pipeline::decode::Encoding;
use crate::progress::ObserverHandle;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default ceiling for uploaded files: 10 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for a document extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2text::ExtractionConfig;
/// use std::time::Duration;
///
/// let config = ExtractionConfig::builder()
///     .provider_timeout(Duration::from_secs(5))
///     .min_candidate_chars(80)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// How long to wait for the page text provider to become ready. Default: 10 s.
    ///
    /// Binding pdfium can take a while on a cold start. Past this bound the
    /// primary stage fails with `ProviderUnavailable` and the fallback
    /// decoder runs instead of blocking the caller.
    pub provider_timeout: Duration,

    /// A fallback candidate must be strictly longer than this many characters. Default: 50.
    ///
    /// Shorter recoveries from raw bytes are almost always noise (stray
    /// dictionary keys, font names) rather than document content.
    pub min_candidate_chars: usize,

    /// Text matching more structural indicators than this is binary-like. Default: 3.
    pub max_indicator_count: usize,

    /// Text with a larger control/high-byte ratio than this is binary-like. Default: 0.2.
    pub max_binary_ratio: f64,

    /// Encodings tried by the fallback decoder, in tie-break order.
    /// Default: UTF-8, Windows-1252, ISO-8859-1.
    pub encodings: Vec<Encoding>,

    /// Files larger than this are refused by the loading layer. Default: 10 MiB.
    pub max_input_bytes: u64,

    /// Path to a pdfium shared library. If None, `PDFIUM_LIB_PATH` or the
    /// system library is used.
    pub pdfium_library: Option<PathBuf>,

    /// Optional observer for state transitions and per-page events.
    pub observer: Option<ObserverHandle>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            min_candidate_chars: 50,
            max_indicator_count: 3,
            max_binary_ratio: 0.2,
            encodings: Encoding::DEFAULT_ORDER.to_vec(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            pdfium_library: None,
            observer: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("provider_timeout", &self.provider_timeout)
            .field("min_candidate_chars", &self.min_candidate_chars)
            .field("max_indicator_count", &self.max_indicator_count)
            .field("max_binary_ratio", &self.max_binary_ratio)
            .field("encodings", &self.encodings)
            .field("max_input_bytes", &self.max_input_bytes)
            .field("pdfium_library", &self.pdfium_library)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn ExtractionObserver>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider_timeout = timeout;
        self
    }

    pub fn min_candidate_chars(mut self, n: usize) -> Self {
        self.config.min_candidate_chars = n;
        self
    }

    pub fn max_indicator_count(mut self, n: usize) -> Self {
        self.config.max_indicator_count = n;
        self
    }

    pub fn max_binary_ratio(mut self, ratio: f64) -> Self {
        self.config.max_binary_ratio = ratio;
        self
    }

    pub fn encodings(mut self, encodings: impl IntoIterator<Item = Encoding>) -> Self {
        self.config.encodings = encodings.into_iter().collect();
        self
    }

    pub fn max_input_bytes(mut self, n: u64) -> Self {
        self.config.max_input_bytes = n;
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.max_binary_ratio) {
            return Err(ExtractError::InvalidConfig(format!(
                "max_binary_ratio must be within 0.0–1.0, got {}",
                c.max_binary_ratio
            )));
        }
        if c.encodings.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "at least one fallback encoding is required".into(),
            ));
        }
        if c.provider_timeout.is_zero() {
            return Err(ExtractError::InvalidConfig(
                "provider_timeout must be greater than zero".into(),
            ));
        }
        if c.max_input_bytes == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_input_bytes must be greater than zero".into(),
            ));
        }
        Ok(self.config)
    }
}
