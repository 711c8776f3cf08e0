use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::constants::MIN_LOOKUP_LEN;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CONTROL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f-\x9f]").unwrap());
static LATIN_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-ZäöüÄÖÜāēīōūĀĒĪŌŪ]+").unwrap());

/// Typographic characters pasted from word processors, mapped to plain ASCII.
const REPLACEMENTS: [(char, &str); 7] = [
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2014}', "-"),
    ('\u{2013}', "-"),
    ('\u{00a0}', " "),
];

/// Collapse runs of whitespace to a single space and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Prepare pasted text for analysis.
///
/// Straightens quotes and dashes, expands the ellipsis character, drops
/// non-printable control characters and normalizes whitespace. The result
/// is what every cache key and word position refers to.
pub fn preprocess_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\u{2026}' {
            out.push_str("...");
        } else if let Some((_, rep)) = REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            out.push_str(rep);
        } else {
            out.push(c);
        }
    }

    let out = CONTROL.replace_all(&out, "");
    clean_text(&out)
}

/// Split text into lowercase Latin word tokens.
/// Digits, punctuation and everything outside the Latin alphabet (plus
/// umlauts and macron vowels) act as separators.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    LATIN_WORD
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lowercase and strip macrons so `Rōma` and `roma` compare equal.
pub fn normalize(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .map(|c| match c {
            'ā' => 'a',
            'ē' => 'e',
            'ī' => 'i',
            'ō' => 'o',
            'ū' => 'u',
            other => other,
        })
        .collect()
}

/// Distinct tokens worth a dictionary lookup, in first-seen order.
pub fn lookup_words(tokens: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|t| t.chars().count() >= MIN_LOOKUP_LEN)
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

/// SHA-256 hex digest of the text, used as the analysis cache key.
pub fn text_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_straightens_typography() {
        let out = preprocess_text("\u{201c}Arma\u{201d} \u{2013} virumque\u{2026}");
        assert_eq!(out, "\"Arma\" - virumque...");
    }

    #[test]
    fn test_preprocess_drops_control_chars() {
        let out = preprocess_text("Gallia\u{0007} est\u{0085}omnis");
        assert_eq!(out, "Gallia estomnis");
    }

    #[test]
    fn test_preprocess_collapses_whitespace() {
        let out = preprocess_text("  Gallia\u{00a0}\u{00a0}est\n\n omnis\t divisa ");
        assert_eq!(out, "Gallia est omnis divisa");
    }

    #[test]
    fn test_preprocess_empty() {
        assert_eq!(preprocess_text(""), "");
        assert_eq!(preprocess_text(" \n\t "), "");
    }

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("Gallia est omnis divisa in partes tres.");
        assert_eq!(
            tokens,
            vec!["gallia", "est", "omnis", "divisa", "in", "partes", "tres"]
        );
    }

    #[test]
    fn test_tokenize_keeps_macrons() {
        let tokens = tokenize("Rōmae, ĀRMA!");
        assert_eq!(tokens, vec!["rōmae", "ārma"]);
    }

    #[test]
    fn test_tokenize_digits_split() {
        let tokens = tokenize("liber2capitulum 12");
        assert_eq!(tokens, vec!["liber", "capitulum"]);
    }

    #[test]
    fn test_normalize_strips_macrons() {
        assert_eq!(normalize("Rōmānī"), "romani");
        assert_eq!(normalize("ĀRMA"), "arma");
    }

    #[test]
    fn test_lookup_words_dedup_and_filter() {
        let tokens = tokenize("a puella puellam amat et puella a");
        assert_eq!(lookup_words(&tokens), vec!["puella", "puellam", "amat", "et"]);
    }

    #[test]
    fn test_text_hash_stable() {
        assert_eq!(
            text_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(text_hash("arma"), text_hash("arma"));
        assert_ne!(text_hash("arma"), text_hash("Arma"));
    }
}
