//! Text canonicalization for user input and model output.

use lazy_static::lazy_static;
use regex::Regex;

use super::rules::{unify_apostrophes, LanguageRules};

/// Non-ASCII punctuation stripped from the edges of user input.
const EXTRA_EDGE_PUNCTUATION: &str = "“”‘’«»¿¡…–—·";

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref LEADING_DETERMINER: Regex =
        Regex::new(r"(?i)^(un|una|unos|unas|el|la|los|las)\s+").unwrap();
    static ref TRAILING_PARENTHETICAL: Regex = Regex::new(r"\s*\([^)]*\)\s*$").unwrap();
}

fn is_edge_char(c: char) -> bool {
    (c.is_ascii_punctuation() && c != '\'')
        || EXTRA_EDGE_PUNCTUATION.contains(c)
        || c.is_whitespace()
}

fn is_storage_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || EXTRA_EDGE_PUNCTUATION.contains(c)
}

/// Collapse runs of whitespace to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Canonical form of raw user text.
///
/// Apostrophes are unified, edge punctuation stripped (internal apostrophes
/// and hyphens survive), whitespace collapsed, and the result lowercased for
/// languages whose rules ask for it.
pub fn normalize_user_text(text: &str, rules: &LanguageRules) -> String {
    let unified = unify_apostrophes(text);
    let stripped = unified.trim_matches(is_edge_char);
    let collapsed = collapse_whitespace(stripped);
    if rules.lowercase {
        collapsed.to_lowercase()
    } else {
        collapsed
    }
}

/// Stricter rendering for stored whole-phrase keys.
///
/// Apostrophes disappear and any other punctuation becomes a space, so a
/// speech engine reading the key never voices punctuation. Never used for
/// the text sent out for transcription.
pub fn storage_safe(text: &str, rules: &LanguageRules) -> String {
    let normalized = normalize_user_text(text, rules);
    let spaced: String = normalized
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| if is_storage_punctuation(c) { ' ' } else { c })
        .collect();
    collapse_whitespace(&spaced)
}

fn strip_wrapping_quotes(text: &str) -> &str {
    text.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’' | '«' | '»'))
        .trim()
}

/// First clause of a model-provided gloss, quotes removed.
pub fn first_clause(raw: &str) -> Option<String> {
    let head = raw.split([',', ';', '|']).next().unwrap_or("");
    let cleaned = collapse_whitespace(strip_wrapping_quotes(head));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Clean a Spanish gloss for storage after `"<phrase>, "`.
///
/// Keeps the first clause, drops a trailing parenthetical and a leading
/// determiner, then strips edge punctuation.
pub fn clean_translation(raw: &str) -> Option<String> {
    let head = raw.split([',', ';', '|']).next().unwrap_or("");
    let without_paren = TRAILING_PARENTHETICAL.replace(head, "");
    let unquoted = strip_wrapping_quotes(&without_paren);
    let without_det = LEADING_DETERMINER.replace(unquoted, "");
    let cleaned = collapse_whitespace(without_det.trim_matches(is_edge_char));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Whole-sentence gloss: quotes and trailing full stop removed, whitespace collapsed.
pub fn clean_sentence(raw: &str) -> Option<String> {
    let unquoted = strip_wrapping_quotes(raw);
    let cleaned = collapse_whitespace(unquoted.trim_end_matches('.'));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
