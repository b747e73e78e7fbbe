//! Multi-encoding recovery: pull readable text straight out of raw bytes.
//!
//! Runs when the page text provider failed or produced garbage. The bytes
//! are decoded under each configured [`Encoding`], and two strategies are
//! applied to every decoding:
//!
//! 1. **Structural spans**: the contents of every `BT … ET` text object.
//!    Uncompressed content streams keep their strings here even when the
//!    document's cross-reference table is too broken for a real parser.
//! 2. **Printable filter**: every character outside the Unicode letter,
//!    number, punctuation, symbol and separator categories becomes a space,
//!    then whitespace is collapsed. The last resort when no text objects
//!    exist at all.
//!
//! All (encoding × strategy) results compete in a single ranking (see
//! [`crate::document::select_best`]) instead of a chain of attempts, so
//! precedence is explicit: longest text wins, printable filter beats
//! structural spans on a tie, earlier encodings beat later ones.

use crate::config::ExtractionConfig;
use crate::document::{select_best, CandidateOrigin, ExtractionCandidate};
use crate::error::FallbackFailure;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Character encodings the fallback decoder can try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// UTF-8; invalid sequences become U+FFFD.
    #[serde(rename = "utf-8")]
    Utf8,
    /// Windows-1252, the encoding most PDF producers mean by "Latin-1".
    #[serde(rename = "windows-1252")]
    Windows1252,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    #[serde(rename = "iso-8859-1")]
    Latin1,
}

/// Windows-1252 code points for bytes 0x80–0x9F.
///
/// The five bytes Windows-1252 leaves undefined map to the C1 control of the
/// same value.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

impl Encoding {
    /// Default candidate list.
    pub const DEFAULT_ORDER: [Encoding; 3] = [Encoding::Utf8, Encoding::Windows1252, Encoding::Latin1];

    /// WHATWG-style label.
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Windows1252 => "windows-1252",
            Encoding::Latin1 => "iso-8859-1",
        }
    }

    /// Decode `bytes`, never failing: undecodable input is replaced.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes),
            Encoding::Latin1 => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Windows1252 => Cow::Owned(
                bytes
                    .iter()
                    .map(|&b| match b {
                        0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(b - 0x80)],
                        _ => char::from(b),
                    })
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "windows-1252" | "cp1252" => Ok(Encoding::Windows1252),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => Ok(Encoding::Latin1),
            other => Err(format!("unknown encoding '{other}'")),
        }
    }
}

// ── Strategies ───────────────────────────────────────────────────────────────

// Markers use ASCII word boundaries; an empty `BT ET` pair is its own match.
static RE_TEXT_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(?-u:\b)BT(?-u:\b)\s*(.*?)\s*(?-u:\b)ET(?-u:\b)").unwrap()
});

static RE_NON_PRINTABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\p{P}\p{S}\p{Z}]").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Contents of every non-empty `BT … ET` span joined with spaces, or `None`
/// if there are none.
pub fn structural_spans(text: &str) -> Option<String> {
    let spans: Vec<&str> = RE_TEXT_OBJECT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
        .filter(|span| !span.is_empty())
        .collect();
    if spans.is_empty() {
        return None;
    }
    Some(spans.join(" ").trim().to_string())
}

/// Replace non-printable characters with spaces and collapse whitespace.
pub fn printable_filter(text: &str) -> String {
    let replaced = RE_NON_PRINTABLE.replace_all(text, " ");
    RE_WHITESPACE.replace_all(&replaced, " ").trim().to_string()
}

// ── Decoder ──────────────────────────────────────────────────────────────────

/// Ranked recovery of text from raw document bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiEncodingDecoder {
    encodings: Vec<Encoding>,
    min_candidate_chars: usize,
}

impl Default for MultiEncodingDecoder {
    fn default() -> Self {
        Self {
            encodings: Encoding::DEFAULT_ORDER.to_vec(),
            min_candidate_chars: 50,
        }
    }
}

impl MultiEncodingDecoder {
    pub fn new(encodings: Vec<Encoding>, min_candidate_chars: usize) -> Self {
        Self {
            encodings,
            min_candidate_chars,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.encodings.clone(), config.min_candidate_chars)
    }

    /// Best candidate per encoding, in encoding order. Empty results are skipped.
    pub fn candidates(&self, bytes: &[u8]) -> Vec<ExtractionCandidate> {
        self.encodings
            .iter()
            .filter_map(|&encoding| {
                let decoded = encoding.decode(bytes);

                let printable = ExtractionCandidate::new(
                    CandidateOrigin::Encoding(encoding),
                    printable_filter(&decoded),
                );
                let structural = structural_spans(&decoded).map(|text| {
                    ExtractionCandidate::new(CandidateOrigin::Structural(encoding), text)
                });

                let best = select_best(std::iter::once(printable).chain(structural))
                    .filter(|c| c.score > 0);
                if let Some(ref c) = best {
                    debug!(
                        "Decoded as {}: {:?} candidate, {} chars",
                        encoding, c.origin, c.score
                    );
                }
                best
            })
            .collect()
    }

    /// Highest-ranked candidate across all encodings, ignoring the length floor.
    pub fn best_candidate(&self, bytes: &[u8]) -> Option<ExtractionCandidate> {
        select_best(self.candidates(bytes))
    }

    /// Best candidate, failing unless it is longer than the configured minimum.
    pub fn decode(&self, bytes: &[u8]) -> Result<ExtractionCandidate, FallbackFailure> {
        self.choose(self.candidates(bytes))
    }

    /// Apply the ranking and the length floor to already-computed candidates.
    pub fn choose(
        &self,
        candidates: Vec<ExtractionCandidate>,
    ) -> Result<ExtractionCandidate, FallbackFailure> {
        let best = select_best(candidates).ok_or(FallbackFailure::NoCandidate)?;
        if best.score <= self.min_candidate_chars {
            return Err(FallbackFailure::TooShort {
                chars: best.score,
                min: self.min_candidate_chars,
            });
        }
        Ok(best)
    }
}
