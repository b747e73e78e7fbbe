//! Property tests for the sanitizer, classifier and fallback decoder.

use edgequake_doc2text::pipeline::classify::{binary_ratio, indicator_total};
use edgequake_doc2text::{sanitize, Classifier, MultiEncodingDecoder};
use proptest::prelude::*;

proptest! {
    #[test]
    fn sanitize_is_idempotent(s in any::<String>()) {
        let once = sanitize(&s);
        let twice = sanitize(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sanitize_never_emits_double_whitespace_bom_or_nul(s in any::<String>()) {
        let out = sanitize(&s);
        let chars: Vec<char> = out.as_str().chars().collect();
        prop_assert!(!chars.windows(2).any(|w| w[0].is_whitespace() && w[1].is_whitespace()));
        prop_assert!(!chars.contains(&'\u{FEFF}'), "output contains a byte-order mark");
        prop_assert!(!chars.contains(&'\0'));
        prop_assert_eq!(out.as_str().trim(), out.as_str());
    }

    #[test]
    fn sanitize_keeps_only_tab_newline_cr_as_ascii_controls(s in "[\\x00-\\x7F]{0,64}") {
        let out = sanitize(&s);
        // Tab, LF and CR survive rule 2 but are collapsed to spaces by rule 6.
        prop_assert!(out.as_str().chars().all(|c| !c.is_ascii_control()));
    }

    #[test]
    fn verdict_is_a_disjunction(count in 0usize..10, ratio in 0.0f64..=1.0) {
        let v = Classifier::default().verdict(count, ratio);
        prop_assert_eq!(v.is_binary_like, count > 3 || ratio > 0.2);
    }

    #[test]
    fn classify_signals_stay_in_range(s in any::<String>()) {
        let v = Classifier::default().classify(&s);
        prop_assert!(v.indicator_count <= indicator_total());
        prop_assert!((0.0..=1.0).contains(&v.binary_ratio));
        prop_assert_eq!(v.binary_ratio, binary_ratio(&s));
        prop_assert_eq!(v.is_binary_like, v.indicator_count > 3 || v.binary_ratio > 0.2);
    }

    #[test]
    fn decoder_candidates_are_scored_by_length(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        let decoder = MultiEncodingDecoder::default();
        for c in decoder.candidates(&bytes) {
            prop_assert!(c.score > 0);
            prop_assert_eq!(c.score, c.text.chars().count());
        }
        if let Ok(best) = decoder.decode(&bytes) {
            prop_assert!(best.score > 50);
        }
    }
}
