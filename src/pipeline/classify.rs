//! Content classification: readable prose vs leaked document syntax.
//!
//! A broken text layer rarely fails loudly. More often the provider hands
//! back the document's own plumbing (`12 0 obj << /Length 44 >> stream`,
//! `BT /F1 12 Tf 72 712 Td (Hello) Tj ET`) or raw compressed bytes rendered
//! as Latin-1 mojibake. Two independent signals catch the two cases:
//!
//! * **indicator count**: how many distinct structural patterns occur.
//!   Catches ASCII-only leaked syntax that contains no odd bytes at all.
//! * **binary ratio**: share of characters in control or high-byte ranges.
//!   Catches compressed streams that contain no recognisable keywords.
//!
//! Either one exceeding its threshold marks the text as binary-like.
//!
//! Content-stream operators are only matched together with the operands
//! they take (`/F1 12 Tf`, `0 0 1 rg`) or alone on their own line (`q`,
//! `S`). A bare one- or two-letter operator appears in nearly every English
//! sentence and would make the count meaningless.
//!
//! Every pattern is compiled with Unicode mode off, so `\b`, `\d`, `\s` and
//! `\w` mean their ASCII classes. PDF syntax is ASCII, and ASCII word
//! boundaries keep the regex engine on its fast path over Latin-1 noise.

use crate::config::ExtractionConfig;
use crate::document::ClassificationVerdict;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Name and pattern of every structural indicator, in reporting order.
const INDICATORS: &[(&str, &str)] = &[
    // File structure
    ("header", r"(?m)^%PDF-\d"),
    ("eof-marker", r"%%EOF"),
    ("object-header", r"\b\d+\s+\d+\s+obj\b"),
    ("obj", r"\bobj\b"),
    ("endobj", r"\bendobj\b"),
    ("stream", r"\bstream\b"),
    ("endstream", r"\bendstream\b"),
    ("xref", r"\bxref\b"),
    ("startxref", r"\bstartxref\b"),
    ("trailer", r"\btrailer\b"),
    ("indirect-reference", r"\b\d+\s+\d+\s+R\b"),
    ("dictionary-type", r"/Type\s*/\w+"),
    ("filter", r"/Filter\s*/\w+"),
    ("length", r"/Length\s+\d+"),
    // Document information dictionary
    ("title", r"/Title\s*\("),
    ("producer", r"/Producer\s*\("),
    ("creator", r"/Creator\s*\("),
    ("creation-date", r"/CreationDate\s*\("),
    ("mod-date", r"/ModDate\s*\("),
    ("author", r"/Author\s*\("),
    ("subject", r"/Subject\s*\("),
    ("keywords", r"/Keywords\s*\("),
    // Text objects
    ("begin-text", r"\bBT\b"),
    ("end-text", r"\bET\b"),
    ("font", r"/[\w.+-]+\s+-?\d*\.?\d+\s+Tf\b"),
    ("text-matrix", r"(?:-?\d*\.?\d+\s+){6}Tm\b"),
    ("text-move", r"-?\d*\.?\d+\s+-?\d*\.?\d+\s+T[dD]\b"),
    ("show-text", r"\)\s*Tj\b"),
    ("show-text-array", r"\]\s*TJ\b"),
    // Colour and graphics state
    ("fill-rgb", r"(?:\d*\.?\d+\s+){3}rg\b"),
    ("stroke-rgb", r"(?:\d*\.?\d+\s+){3}RG\b"),
    ("graphics-state", r"/[\w.+-]+\s+gs\b"),
    ("save-restore", r"(?m)^[ \t]*[qQ][ \t]*\r?$"),
    ("concat-matrix", r"(?:-?\d*\.?\d+\s+){6}cm\b"),
    // Path construction and painting
    ("rectangle", r"(?:-?\d*\.?\d+\s+){4}re\b"),
    ("move-to", r"-?\d*\.?\d+\s+-?\d*\.?\d+\s+m\b"),
    ("line-to", r"-?\d*\.?\d+\s+-?\d*\.?\d+\s+l\b"),
    ("curve-to", r"(?:-?\d*\.?\d+\s+){6}c\b"),
    ("curve-to-short", r"(?:-?\d*\.?\d+\s+){4}[vy]\b"),
    ("stroke", r"(?m)^[ \t]*[Ss][ \t]*\r?$"),
    ("fill", r"(?m)^[ \t]*(?:[fF]|[Bb]\*?|f\*)[ \t]*\r?$"),
    ("end-path", r"(?m)^[ \t]*[nh][ \t]*\r?$"),
];

static INDICATOR_REGEXES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    INDICATORS
        .iter()
        .map(|&(name, pattern)| {
            let re = RegexBuilder::new(pattern)
                .unicode(false)
                .build()
                .expect("indicator patterns are valid");
            (name, re)
        })
        .collect()
});

/// Thresholds deciding when text counts as binary-like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    max_indicator_count: usize,
    max_binary_ratio: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            max_indicator_count: 3,
            max_binary_ratio: 0.2,
        }
    }
}

impl Classifier {
    pub fn new(max_indicator_count: usize, max_binary_ratio: f64) -> Self {
        Self {
            max_indicator_count,
            max_binary_ratio,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.max_indicator_count, config.max_binary_ratio)
    }

    /// Classify `text`. Empty text is never binary-like.
    pub fn classify(&self, text: &str) -> ClassificationVerdict {
        if text.is_empty() {
            return self.verdict(0, 0.0);
        }

        let matched: Vec<&str> = INDICATOR_REGEXES
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(name, _)| *name)
            .collect();
        let indicator_count = matched.len();
        let ratio = binary_ratio(text);

        if indicator_count > 0 {
            debug!("Structural indicators matched: {:?}", matched);
        }

        self.verdict(indicator_count, ratio)
    }

    /// Apply the thresholds to already-measured signals.
    pub fn verdict(&self, indicator_count: usize, binary_ratio: f64) -> ClassificationVerdict {
        ClassificationVerdict {
            is_binary_like: indicator_count > self.max_indicator_count
                || binary_ratio > self.max_binary_ratio,
            indicator_count,
            binary_ratio,
        }
    }
}

/// Number of indicators in the built-in set.
pub fn indicator_total() -> usize {
    INDICATORS.len()
}

fn is_binary_char(c: char) -> bool {
    matches!(
        c,
        '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'..='\u{FF}'
    )
}

/// Share of characters in `0x00–0x08, 0x0B, 0x0C, 0x0E–0x1F, 0x7F–0xFF`.
pub fn binary_ratio(text: &str) -> f64 {
    let (binary, total) = text.chars().fold((0usize, 0usize), |(b, t), c| {
        (b + usize::from(is_binary_char(c)), t + 1)
    });
    if total == 0 {
        0.0
    } else {
        binary as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_PDF: &str = "%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
4 0 obj\n<< /Length 44 >>\nstream\nBT /F1 24 Tf 72 712 Td (Hi) Tj ET\nendstream\nendobj\n\
xref\n0 5\ntrailer\n<< /Root 1 0 R /Size 5 >>\nstartxref\n512\n%%EOF";

    #[test]
    fn test_has_at_least_thirty_indicators() {
        assert!(indicator_total() >= 30);
    }

    #[test]
    fn test_raw_pdf_is_binary_like() {
        let v = Classifier::default().classify(RAW_PDF);
        assert!(v.is_binary_like);
        assert!(v.indicator_count > 10, "got {}", v.indicator_count);
    }

    #[test]
    fn test_keyword_soup_after_header_is_binary_like() {
        let v = Classifier::default().classify("%PDF-1.4 obj stream endstream xref trailer");
        assert!(v.is_binary_like);
    }

    #[test]
    fn test_prose_is_not_binary_like() {
        let prose = "Experienced DevOps engineer with 5 years of expertise in cloud \
architecture, automation and infrastructure management. Led a team of 12 across \
three time zones; shipped CI/CD pipelines for Kubernetes and Azure WebApps.";
        let v = Classifier::default().classify(prose);
        assert!(!v.is_binary_like, "{v:?}");
        assert_eq!(v.indicator_count, 0);
        assert_eq!(v.binary_ratio, 0.0);
    }

    #[test]
    fn test_accented_prose_matches_no_indicator() {
        let c = Classifier::default();
        for text in [
            "An ordinary line about Kafka data pipelines and ownership of the build.",
            "Résumé: café owner in Zürich, fluent in français and español.",
            "Übersicht der Projekte 2019–2023; Leitung eines Teams von 8 Personen.",
        ] {
            let v = c.classify(text);
            assert_eq!(v.indicator_count, 0, "{text:?}: {v:?}");
        }
    }

    #[test]
    fn test_indicators_match_next_to_non_ascii_letters() {
        let v = Classifier::default().classify("é12 0 objé endobjé");
        assert_eq!(v.indicator_count, 3, "{v:?}");
    }

    #[test]
    fn test_large_latin1_noise_classifies_quickly() {
        let mut state: u32 = 0x1234_5678;
        let noise: String = (0..1024 * 1024)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                char::from((state >> 16) as u8)
            })
            .collect();
        let start = std::time::Instant::now();
        let v = Classifier::default().classify(&noise);
        assert!(v.is_binary_like);
        assert!(
            start.elapsed() < std::time::Duration::from_secs(5),
            "took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_single_letter_words_do_not_count_as_operators() {
        let v = Classifier::default().classify("a b c f h l m n q s v y S Q B F");
        assert_eq!(v.indicator_count, 0);
    }

    #[test]
    fn test_content_stream_operators_with_operands() {
        let stream = "q\n1 0 0 1 72 700 cm\n0 0 1 rg\n10 10 200 50 re\nf\nQ\n";
        let v = Classifier::default().classify(stream);
        assert!(v.is_binary_like);
        assert!(v.indicator_count >= 4);
    }

    #[test]
    fn test_exactly_three_indicators_is_not_binary_like() {
        let v = Classifier::default().classify("endobj endstream startxref");
        assert_eq!(v.indicator_count, 3);
        assert!(!v.is_binary_like);
    }

    #[test]
    fn test_four_indicators_is_binary_like() {
        let v = Classifier::default().classify("endobj endstream startxref xref");
        assert_eq!(v.indicator_count, 4);
        assert!(v.is_binary_like);
    }

    #[test]
    fn test_ratio_exactly_at_threshold_is_not_binary_like() {
        let v = Classifier::default().classify("\u{01}abcd");
        assert_eq!(v.binary_ratio, 0.2);
        assert!(!v.is_binary_like);
    }

    #[test]
    fn test_ratio_just_above_threshold_is_binary_like() {
        let c = Classifier::default();
        assert!(!c.verdict(0, 0.2).is_binary_like);
        assert!(c.verdict(0, 0.200_000_1).is_binary_like);
        assert!(c.classify("\u{01}\u{02}abcdefg").is_binary_like);
    }

    #[test]
    fn test_high_bytes_count_as_binary() {
        assert_eq!(binary_ratio("ÿþ"), 1.0);
        assert_eq!(binary_ratio("ab\u{FFFD}"), 0.0);
    }

    #[test]
    fn test_empty_text_is_not_binary_like() {
        let v = Classifier::default().classify("");
        assert!(!v.is_binary_like);
        assert_eq!(v.indicator_count, 0);
        assert_eq!(v.binary_ratio, 0.0);
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = Classifier::new(0, 0.0);
        assert!(strict.classify("endobj").is_binary_like);
        assert!(strict.classify("é").is_binary_like);
        assert!(!strict.classify("plain words").is_binary_like);
    }
}
