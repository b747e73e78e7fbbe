//! Data model shared by every pipeline stage.
//!
//! Everything here is plain data: the pipeline creates these values, passes
//! them between stages by value or reference, and hands the final
//! [`ExtractionOutput`] to the caller. Nothing is cached or shared between
//! calls.

use crate::pipeline::decode::Encoding;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

// ── Input ────────────────────────────────────────────────────────────────

/// Declared format of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// `application/pdf`
    Pdf,
    /// `text/plain`: trusted verbatim, bypasses extraction.
    PlainText,
    /// Anything else; rejected with `UnsupportedMediaType`.
    Other(String),
}

impl MediaType {
    /// Map a MIME type string to a media type.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => MediaType::Pdf,
            "text/plain" => MediaType::PlainText,
            _ => MediaType::Other(essence),
        }
    }

    /// Media type implied by a file extension, if it is one we know.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(MediaType::Pdf),
            "txt" | "text" | "md" => Some(MediaType::PlainText),
            _ => None,
        }
    }

    /// Canonical MIME string for diagnostics and error messages.
    pub fn as_mime(&self) -> &str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::PlainText => "text/plain",
            MediaType::Other(s) => s,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// An uploaded document: immutable bytes plus what the uploader claims it is.
///
/// The bytes live behind an `Arc` so the orchestrator can hand them to the
/// blocking pool without copying a multi-megabyte buffer.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Arc<[u8]>,
    media_type: MediaType,
    name: String,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: MediaType, name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
            name: name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One text fragment returned by a page text provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken {
    /// 1-indexed page number the token came from.
    pub page_num: usize,
    pub content: String,
}

impl PageToken {
    pub fn new(page_num: usize, content: impl Into<String>) -> Self {
        Self {
            page_num,
            content: content.into(),
        }
    }
}

// ── Candidates ───────────────────────────────────────────────────────────

/// Where an [`ExtractionCandidate`] came from.
///
/// Declaration order is preference order: when two candidates score the
/// same, the one whose origin is declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "encoding", rename_all = "kebab-case")]
pub enum CandidateOrigin {
    /// Text assembled by the page text provider.
    Primary,
    /// Printable-character filter over the bytes decoded with this encoding.
    Encoding(Encoding),
    /// `BT … ET` text-object spans found in the bytes decoded with this encoding.
    Structural(Encoding),
}

impl CandidateOrigin {
    /// Lower is preferred.
    pub fn preference(&self) -> u8 {
        match self {
            CandidateOrigin::Primary => 0,
            CandidateOrigin::Encoding(_) => 1,
            CandidateOrigin::Structural(_) => 2,
        }
    }

    pub fn encoding(&self) -> Option<Encoding> {
        match self {
            CandidateOrigin::Primary => None,
            CandidateOrigin::Encoding(e) | CandidateOrigin::Structural(e) => Some(*e),
        }
    }
}

/// A proposed text recovery with its quality score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionCandidate {
    pub origin: CandidateOrigin,
    pub text: String,
    /// Character count of `text`.
    pub score: usize,
}

impl ExtractionCandidate {
    /// Build a candidate from already-trimmed text; the score is its length in chars.
    pub fn new(origin: CandidateOrigin, text: String) -> Self {
        let score = text.chars().count();
        Self {
            origin,
            text,
            score,
        }
    }

    /// Rank two candidates: higher score first, then origin preference.
    ///
    /// `Ordering::Greater` means `self` is the better candidate. Candidates
    /// that tie on both keys compare `Equal`; [`select_best`] then keeps the
    /// earlier one.
    pub fn rank(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.origin.preference().cmp(&self.origin.preference()))
    }
}

/// Pick the best candidate; on a full tie the first one seen wins.
pub fn select_best<I>(candidates: I) -> Option<ExtractionCandidate>
where
    I: IntoIterator<Item = ExtractionCandidate>,
{
    candidates.into_iter().fold(None, |best, c| match best {
        Some(b) if c.rank(&b) != Ordering::Greater => Some(b),
        _ => Some(c),
    })
}

// ── Classification ───────────────────────────────────────────────────────

/// Result of running the content classifier over a string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub is_binary_like: bool,
    /// Distinct structural indicators found.
    pub indicator_count: usize,
    /// Fraction of characters in control / high-byte ranges, in `[0, 1]`.
    pub binary_ratio: f64,
}

// ── Output ───────────────────────────────────────────────────────────────

/// Normalised text ready for prompt construction.
///
/// Only [`crate::pipeline::sanitize::sanitize`] creates values of this type,
/// so holding one proves the text went through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct SanitizedText(String);

impl SanitizedText {
    pub(crate) fn new_unchecked(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for SanitizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which path produced the accepted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionSource {
    Primary,
    FallbackEncoding,
    PlainText,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtractionSource::Primary => "primary",
            ExtractionSource::FallbackEncoding => "fallback-encoding",
            ExtractionSource::PlainText => "plain-text",
        })
    }
}

/// States of the extraction orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionState {
    NotStarted,
    PrimaryAttempted,
    FallbackAttempted,
    Accepted,
    Rejected,
}

/// Debugging record attached to every successful extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub source: ExtractionSource,
    /// Characters in the sanitized text.
    pub character_count: usize,
    /// Verdict for the accepted text before sanitisation.
    pub classification: ClassificationVerdict,
    /// Candidate origin when the text came from the fallback decoder.
    pub origin: Option<CandidateOrigin>,
    /// Every state the orchestrator passed through, in order.
    pub state_path: Vec<ExtractionState>,
}

/// Final result of a successful extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    pub text: SanitizedText,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(origin: CandidateOrigin, text: &str) -> ExtractionCandidate {
        ExtractionCandidate::new(origin, text.to_string())
    }

    #[test]
    fn media_type_from_mime() {
        assert_eq!(MediaType::from_mime("application/pdf"), MediaType::Pdf);
        assert_eq!(MediaType::from_mime("text/plain; charset=utf-8"), MediaType::PlainText);
        assert_eq!(
            MediaType::from_mime("Image/PNG"),
            MediaType::Other("image/png".into())
        );
    }

    #[test]
    fn score_counts_chars_not_bytes() {
        let c = candidate(CandidateOrigin::Primary, "café");
        assert_eq!(c.score, 4);
    }

    #[test]
    fn higher_score_wins_regardless_of_origin() {
        let best = select_best(vec![
            candidate(CandidateOrigin::Primary, "short"),
            candidate(CandidateOrigin::Structural(Encoding::Latin1), "much longer text"),
        ])
        .unwrap();
        assert_eq!(best.origin, CandidateOrigin::Structural(Encoding::Latin1));
    }

    #[test]
    fn ties_follow_origin_preference() {
        let best = select_best(vec![
            candidate(CandidateOrigin::Structural(Encoding::Utf8), "abcd"),
            candidate(CandidateOrigin::Encoding(Encoding::Utf8), "wxyz"),
            candidate(CandidateOrigin::Primary, "1234"),
        ])
        .unwrap();
        assert_eq!(best.origin, CandidateOrigin::Primary);

        let best = select_best(vec![
            candidate(CandidateOrigin::Structural(Encoding::Utf8), "abcd"),
            candidate(CandidateOrigin::Encoding(Encoding::Latin1), "wxyz"),
        ])
        .unwrap();
        assert_eq!(best.origin, CandidateOrigin::Encoding(Encoding::Latin1));
    }

    #[test]
    fn full_tie_keeps_first_candidate() {
        let best = select_best(vec![
            candidate(CandidateOrigin::Encoding(Encoding::Utf8), "same"),
            candidate(CandidateOrigin::Encoding(Encoding::Windows1252), "same"),
        ])
        .unwrap();
        assert_eq!(best.origin, CandidateOrigin::Encoding(Encoding::Utf8));
    }

    #[test]
    fn select_best_of_nothing_is_none() {
        assert!(select_best(Vec::new()).is_none());
    }

    #[test]
    fn extraction_source_serialises_kebab_case() {
        let json = serde_json::to_string(&ExtractionSource::FallbackEncoding).unwrap();
        assert_eq!(json, "\"fallback-encoding\"");
        assert_eq!(ExtractionSource::PlainText.to_string(), "plain-text");
    }
}
