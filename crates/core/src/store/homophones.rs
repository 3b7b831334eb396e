//! Cross-linking of entries that share a transcription.
//!
//! Homophones live in a reserved suffix of the association so the base
//! `"<phrase>, <translation>"` is never disturbed:
//!
//! ```text
//! l'air (m), aire | homófonos: ère; aire
//! ```
//!
//! Only single-token canonical words take part, and only rows that already
//! carry a base association, so a link always exists in both directions.

use super::compiler::ENTRY_TABLE;
use super::executor::Cursor;
use super::statement::{SqlValue, Statement, StatementKind};
use crate::error::Result;
use crate::language::normalize::normalize_user_text;
use crate::language::LanguageRules;

pub const SECTION_SEPARATOR: &str = " | homófonos: ";
pub const ITEM_SEPARATOR: &str = "; ";

/// Punctuation that marks a legacy, non-canonical stored word.
const TRAILING_JUNK: &[char] = &['.', ',', ';', ':'];

/// Split an association into its base and homophone items.
pub fn split_association(association: &str) -> (&str, Vec<&str>) {
    match association.split_once(SECTION_SEPARATOR) {
        Some((base, tail)) => (
            base.trim(),
            tail.split(';').map(str::trim).filter(|s| !s.is_empty()).collect(),
        ),
        None => (association.trim(), Vec::new()),
    }
}

/// Association with `word` added to the homophone section.
///
/// `None` when nothing changes: the word is already listed, the word is
/// blank, or there is no base association to attach a suffix to.
pub fn append_homophone(association: Option<&str>, word: &str) -> Option<String> {
    let word = word.trim();
    let current = association.unwrap_or("").trim();
    if word.is_empty() || current.is_empty() {
        return None;
    }
    let (base, mut items) = split_association(current);
    if base.is_empty() || items.contains(&word) {
        return None;
    }
    items.push(word);
    Some(format!("{}{}{}", base, SECTION_SEPARATOR, items.join(ITEM_SEPARATOR)))
}

/// Form used to decide linking eligibility. Stored values are never rewritten.
pub fn canonical_word(rules: &LanguageRules, word: &str) -> String {
    let normalized = normalize_user_text(word, rules);
    rules.strip_contraction(&normalized).to_string()
}

/// Single token, already in canonical form.
pub fn is_link_eligible(rules: &LanguageRules, word: &str) -> bool {
    let trimmed = word.trim();
    !trimmed.is_empty()
        && !trimmed.chars().any(char::is_whitespace)
        && !trimmed.ends_with(TRAILING_JUNK)
        && canonical_word(rules, trimmed) == trimmed
}

/// SQL filters excluding phrases and legacy variants from `column`.
fn peer_filter(rules: &LanguageRules, column: &str) -> String {
    let mut clauses = vec![format!("{} NOT LIKE '%% %%'", column)];
    for prefix in rules.contraction_prefixes() {
        clauses.push(format!("{} NOT LIKE '{}%%'", column, prefix.replace('\'', "''")));
    }
    for junk in TRAILING_JUNK {
        clauses.push(format!("{} NOT LIKE '%%{}'", column, junk));
    }
    clauses.join(" AND ")
}

/// `column` is not already listed in the homophone section of `association`.
fn not_listed(column: &str, association: &str) -> String {
    format!(
        "NOT ({column} = ANY(regexp_split_to_array(\
         CASE WHEN position('{sep}' in COALESCE({assoc}, '')) > 0 \
         THEN split_part(COALESCE({assoc}, ''), '{sep}', 2) ELSE '' END, '\\s*;\\s*')))",
        column = column,
        assoc = association,
        sep = SECTION_SEPARATOR,
    )
}

fn suffix_join(association: &str) -> String {
    format!(
        "CASE WHEN position('{sep}' in {assoc}) > 0 THEN '{item}' ELSE '{sep}' END",
        sep = SECTION_SEPARATOR,
        item = ITEM_SEPARATOR,
        assoc = association
    )
}

/// Statements that link `word` with every same-transcription peer.
///
/// The first updates the word's own suffix with all missing peers; the
/// second appends the word to each peer's suffix. Both are no-ops on
/// re-run. Returns nothing for ineligible words.
pub fn link_statements(
    rules: &LanguageRules,
    list_id: i64,
    word: &str,
    transcription: Option<&str>,
) -> Vec<Statement> {
    let Some(transcription) = transcription.map(str::trim).filter(|t| !t.is_empty()) else {
        return Vec::new();
    };
    if !is_link_eligible(rules, word) {
        return Vec::new();
    }

    let peers = format!(
        "w2.list_id = w1.list_id AND w2.\"IPA_word\" = w1.\"IPA_word\" AND w2.word <> w1.word \
         AND COALESCE(w2.association, '') <> '' AND {} AND {}",
        peer_filter(rules, "w2.word"),
        not_listed("w2.word", "w1.association")
    );
    let own = Statement::new(
        StatementKind::LinkHomophonesSelf,
        format!(
            "UPDATE {table} w1 SET association = w1.association || {join} || \
             (SELECT string_agg(w2.word, '{item}' ORDER BY w2.word) FROM {table} w2 WHERE {peers}) \
             WHERE w1.list_id = %s AND w1.word = %s AND w1.\"IPA_word\" = %s \
             AND COALESCE(w1.association, '') <> '' \
             AND EXISTS (SELECT 1 FROM {table} w2 WHERE {peers});",
            table = ENTRY_TABLE,
            join = suffix_join("w1.association"),
            item = ITEM_SEPARATOR,
            peers = peers,
        ),
        vec![list_id.into(), word.into(), transcription.into()],
    );

    let others = Statement::new(
        StatementKind::LinkHomophonesPeers,
        format!(
            "UPDATE {table} w SET association = w.association || {join} || %s \
             WHERE w.list_id = %s AND w.\"IPA_word\" = %s AND w.word <> %s \
             AND COALESCE(w.association, '') <> '' AND {filter} AND {listed} \
             AND EXISTS (SELECT 1 FROM {table} cur WHERE cur.list_id = w.list_id AND cur.word = %s \
             AND cur.\"IPA_word\" = %s AND COALESCE(cur.association, '') <> '');",
            table = ENTRY_TABLE,
            join = suffix_join("w.association"),
            filter = peer_filter(rules, "w.word"),
            listed = not_listed("%s", "w.association"),
        ),
        vec![
            word.into(),
            list_id.into(),
            transcription.into(),
            word.into(),
            word.into(),
            word.into(),
            transcription.into(),
        ],
    );

    vec![own, others]
}

fn select_entry(list_id: i64, word: &str) -> Statement {
    Statement::new(
        StatementKind::SelectEntry,
        format!(
            "SELECT association, \"IPA_word\" FROM {} WHERE list_id = %s AND word = %s;",
            ENTRY_TABLE
        ),
        vec![list_id.into(), word.into()],
    )
}

fn select_candidates(list_id: i64, word: &str, transcription: &str) -> Statement {
    Statement::new(
        StatementKind::SelectHomophoneCandidates,
        format!(
            "SELECT word, association FROM {} WHERE list_id = %s AND \"IPA_word\" = %s \
             AND word <> %s AND word NOT LIKE '%% %%';",
            ENTRY_TABLE
        ),
        vec![list_id.into(), transcription.into(), word.into()],
    )
}

fn set_association(list_id: i64, word: &str, association: &str) -> Statement {
    Statement::new(
        StatementKind::SetAssociation,
        format!(
            "UPDATE {} SET association = %s WHERE word = %s AND list_id = %s;",
            ENTRY_TABLE
        ),
        vec![association.into(), word.into(), list_id.into()],
    )
}

fn text(row: &[SqlValue], index: usize) -> Option<String> {
    row.get(index).and_then(SqlValue::as_text).map(str::to_string)
}

/// Link `word` against the live table.
///
/// Uses the transcription actually stored for the word, so the result
/// matches what the compiled statements do. Returns the number of
/// association updates issued; errors propagate to the caller.
pub fn link_homophones_live<C: Cursor + ?Sized>(
    cursor: &mut C,
    rules: &LanguageRules,
    list_id: i64,
    word: &str,
) -> Result<usize> {
    if !is_link_eligible(rules, word) {
        return Ok(0);
    }
    let Some(row) = cursor.query(&select_entry(list_id, word))?.into_iter().next() else {
        return Ok(0);
    };
    let mut current = text(&row, 0);
    let Some(transcription) = text(&row, 1).filter(|t| !t.trim().is_empty()) else {
        return Ok(0);
    };
    if current.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Ok(0);
    }

    let candidates = cursor.query(&select_candidates(list_id, word, transcription.trim()))?;
    let mut updates = 0;
    for candidate in candidates {
        let Some(other) = text(&candidate, 0).map(|w| w.trim().to_string()) else {
            continue;
        };
        if other.is_empty() || other == word || !is_link_eligible(rules, &other) {
            continue;
        }
        let other_association = text(&candidate, 1);
        if other_association.as_deref().map(str::trim).unwrap_or("").is_empty() {
            continue;
        }

        if let Some(updated) = append_homophone(current.as_deref(), &other) {
            cursor.execute(&set_association(list_id, word, &updated))?;
            current = Some(updated);
            updates += 1;
        }
        if let Some(updated) = append_homophone(other_association.as_deref(), word) {
            cursor.execute(&set_association(list_id, &other, &updated))?;
            updates += 1;
        }
    }
    if updates > 0 {
        log::info!("Linked homophones of {:?} ({} updates)", word, updates);
    }
    Ok(updates)
}
