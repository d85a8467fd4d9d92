//! Text normalization for address comparison

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::gazetteer::Gazetteer;

/// One substitution made while canonicalizing an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Record))]
pub struct Correction {
    pub from: String,
    pub to: String,
}

/// Canonical text plus the substitutions that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub text: String,
    pub corrections: Vec<Correction>,
}

/// Fold Turkish text to lowercase ASCII
///
/// - Maps dotless/dotted I forms so `İSTANBUL`, `Istanbul`, `ıstanbul` agree
/// - Removes diacritics (ç, ğ, ö, ş, ü, â, î, û)
/// - Turns punctuation into word breaks
/// - Collapses whitespace
pub fn fold_turkish(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            'ı' | 'İ' => 'i',
            _ => c,
        })
        .collect::<String>()
        // Unicode normalize (NFKD to separate combining characters)
        .nfkd()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_ascii() {
                Some(' ')
            } else {
                // Combining marks and non-Latin letters
                None
            }
        })
        .collect();

    collapse_whitespace(&folded).trim().to_string()
}

/// Fold, then expand known abbreviations at word boundaries.
pub fn canonicalize(text: &str, gazetteer: &Gazetteer) -> NormalizedText {
    let folded = fold_turkish(text);
    let mut corrections = Vec::new();

    let words: Vec<&str> = folded
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| match gazetteer.expansion(word) {
            Some(full) => {
                corrections.push(Correction {
                    from: word.to_string(),
                    to: full.to_string(),
                });
                full
            }
            None => word,
        })
        .collect();

    NormalizedText {
        text: words.join(" "),
        corrections,
    }
}

/// Collapse multiple whitespace characters into a single space
pub(crate) fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(c);
            prev_was_space = false;
        }
    }

    result
}
