//! Splitting normalized phrases into vocabulary tokens.

use std::collections::HashSet;

use super::rules::LanguageRules;

/// Quote and bracket punctuation removed from token edges.
const TOKEN_STRIP: &[char] = &[
    '"', '“', '”', '‘', '’', '(', ')', '[', ']', '{', '}', '.', ',', ';', ':', '!', '?', '«', '»',
];

/// Ordered tokens of a phrase, duplicates kept.
///
/// Contraction prefixes listed by the language rules are dropped, so
/// `d'erreurs` yields `erreurs`.
pub fn split_tokens(text: &str, rules: &LanguageRules) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let stripped = raw.trim_matches(TOKEN_STRIP);
            let lowered = if rules.lowercase {
                stripped.to_lowercase()
            } else {
                stripped.to_string()
            };
            let token = rules.strip_contraction(&lowered).to_string();
            if token.is_empty() {
                None
            } else {
                Some(token)
            }
        })
        .collect()
}

/// Distinct tokens in first-seen order, compared case-insensitively.
pub fn tokenize(text: &str, rules: &LanguageRules) -> Vec<String> {
    let mut seen = HashSet::new();
    split_tokens(text, rules)
        .into_iter()
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// True when normalized input holds more than one whitespace-separated token.
pub fn is_multi_token(normalized: &str) -> bool {
    normalized.split_whitespace().nth(1).is_some()
}
