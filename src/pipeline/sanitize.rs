//! Sanitisation: normalise accepted text into one flat, canonical line.
//!
//! Extracted text carries debris the prompt builder must never see: NUL
//! bytes from broken font maps, stray C0 controls, byte-order marks glued
//! between pages, decomposed accents from some producers, and ragged
//! whitespace from column layouts.
//!
//! ## Rule Order
//!
//! Controls and BOMs go before trimming so a leading `\u{FEFF}` cannot shield
//! whitespace from the trim. NFC runs after removal so a combining mark that
//! followed a stripped control can still compose with its base. Whitespace is
//! collapsed last, which also discards line structure: downstream consumers
//! get a single line.

use crate::document::SanitizedText;
use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

/// Apply all sanitisation rules to `input`.
///
/// Rules (applied in order):
/// 1. Remove NUL characters
/// 2. Remove ASCII controls other than tab, newline and carriage return
/// 3. Remove every byte-order mark, not just a leading one
/// 4. Trim leading and trailing whitespace
/// 5. Unicode canonical composition (NFC)
/// 6. Collapse every whitespace run into a single ASCII space
///
/// Never fails; an empty input gives an empty result.
pub fn sanitize(input: &str) -> SanitizedText {
    let s = remove_nul(input);
    let s = remove_control_chars(&s);
    let s = remove_bom(&s);
    let s = s.trim();
    let s = normalize_nfc(s);
    SanitizedText::new_unchecked(collapse_whitespace(&s))
}

// ── Rule 1: NUL ──────────────────────────────────────────────────────────────

fn remove_nul(input: &str) -> String {
    input.replace('\0', "")
}

// ── Rule 2: ASCII controls except \t \n \r ───────────────────────────────────

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

fn remove_control_chars(input: &str) -> String {
    input.chars().filter(|&c| !is_stripped_control(c)).collect()
}

// ── Rule 3: BOM ──────────────────────────────────────────────────────────────

fn remove_bom(input: &str) -> String {
    input.replace('\u{FEFF}', "")
}

// ── Rule 5: NFC ──────────────────────────────────────────────────────────────

fn normalize_nfc(input: &str) -> String {
    match is_nfc_quick(input.chars()) {
        IsNormalized::Yes => input.to_string(),
        IsNormalized::No | IsNormalized::Maybe => input.nfc().collect(),
    }
}

// ── Rule 6: whitespace ───────────────────────────────────────────────────────

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_was_space = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !prev_was_space {
                out.push(' ');
                prev_was_space = true;
            }
        } else {
            out.push(c);
            prev_was_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_example() {
        assert_eq!(sanitize("  café   membre  ").as_str(), "café membre");
    }

    #[test]
    fn test_decomposed_accent_is_composed() {
        let decomposed = "cafe\u{0301}";
        let out = sanitize(decomposed);
        assert_eq!(out.as_str(), "café");
        assert_eq!(out.char_count(), 4);
    }

    #[test]
    fn test_nul_and_controls_removed() {
        assert_eq!(sanitize("a\0b\u{01}c\u{7F}d").as_str(), "abcd");
    }

    #[test]
    fn test_tab_newline_cr_become_single_space() {
        assert_eq!(sanitize("Jane Doe\nEngineer\n").as_str(), "Jane Doe Engineer");
        assert_eq!(sanitize("a\t\r\n\tb").as_str(), "a b");
    }

    #[test]
    fn test_bom_removed_everywhere() {
        assert_eq!(sanitize("\u{FEFF}page one\u{FEFF} page two").as_str(), "page one page two");
    }

    #[test]
    fn test_bom_does_not_shield_leading_whitespace() {
        assert_eq!(sanitize("\u{FEFF}  hello").as_str(), "hello");
    }

    #[test]
    fn test_control_between_base_and_mark_still_composes() {
        assert_eq!(sanitize("e\u{01}\u{0301}").as_str(), "é");
    }

    #[test]
    fn test_unicode_whitespace_collapsed() {
        assert_eq!(sanitize("a\u{00A0}\u{2003} b").as_str(), "a b");
    }

    #[test]
    fn test_c1_range_is_kept() {
        // Only ASCII controls are stripped; U+0085 is whitespace and collapses.
        assert_eq!(sanitize("a\u{0085}b").as_str(), "a b");
        assert_eq!(sanitize("a\u{0090}b").as_str(), "a\u{0090}b");
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert!(sanitize("").is_empty());
        assert!(sanitize(" \n\t ").is_empty());
        assert!(sanitize("\0\u{FEFF}").is_empty());
    }

    #[test]
    fn test_idempotent_on_messy_input() {
        let once = sanitize("\u{FEFF} Re\u{0301}sume\u{0301}\0 \n\n  Rust\u{0B} dev ");
        let twice = sanitize(once.as_str());
        assert_eq!(once, twice);
        assert_eq!(once.as_str(), "Résumé Rust dev");
    }
}
