//! Compilation of resolved entries into idempotent write statements.
//!
//! Each entry becomes, in order: an insert that is a no-op when
//! `(word, list_id)` already exists, an update of the transcription when it
//! is still absent, and an update of the association when it is absent,
//! empty, or a corrupted legacy value holding several commas.

use lazy_static::lazy_static;
use regex::Regex;

use super::statement::{SqlValue, Statement, StatementKind};
use crate::error::{Error, Result};

/// Table holding the vocabulary entries.
pub const ENTRY_TABLE: &str = "words";
/// Word column of the rejected-words registry.
pub const REJECTED_WORD_COLUMN: &str = "palabra";

lazy_static! {
    static ref TABLE_IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap();
}

/// NOT EXISTS guard against a per-user rejected-words registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedWordsGuard {
    table: String,
    user_id: String,
    language: String,
}

impl RejectedWordsGuard {
    /// Decide whether the guard is active for this call.
    ///
    /// Active when a registry name and a user identity are both present. A
    /// registry without a user, or a registry name that is not a plain
    /// (optionally schema-qualified) identifier, is a configuration error.
    pub fn resolve(
        table: Option<&str>,
        user_id: Option<&str>,
        language: &str,
    ) -> Result<Option<Self>> {
        let table = match table.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return Ok(None),
        };
        if !TABLE_IDENTIFIER.is_match(table) {
            return Err(Error::Config(format!(
                "invalid rejected-words table identifier: {:?}",
                table
            )));
        }
        let user_id = match user_id.map(str::trim).filter(|u| !u.is_empty()) {
            Some(u) => u,
            None => {
                return Err(Error::Config(format!(
                    "a user id is required to enforce the rejected-words table {}",
                    table
                )))
            }
        };
        Ok(Some(Self {
            table: table.to_string(),
            user_id: user_id.to_string(),
            language: language.trim().to_lowercase(),
        }))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn clause(&self) -> String {
        format!(
            "NOT EXISTS (SELECT 1 FROM {} r WHERE r.user_id = %s AND r.language = %s AND r.{} = %s)",
            self.table, REJECTED_WORD_COLUMN
        )
    }

    fn params(&self, word: &str) -> [SqlValue; 3] {
        [
            self.user_id.as_str().into(),
            self.language.as_str().into(),
            word.into(),
        ]
    }
}

/// Collects statements and hands them out only once all of them validate.
#[derive(Debug)]
pub struct StatementBuilder<'g> {
    list_id: i64,
    guard: Option<&'g RejectedWordsGuard>,
    statements: Vec<Statement>,
}

impl<'g> StatementBuilder<'g> {
    pub fn new(list_id: i64, guard: Option<&'g RejectedWordsGuard>) -> Self {
        Self {
            list_id,
            guard,
            statements: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Is an insert for `word` already queued?
    pub fn has_insert_for(&self, word: &str) -> bool {
        self.statements
            .iter()
            .any(|s| s.kind == StatementKind::InsertEntry && s.text_param(0) == Some(word))
    }

    /// Words targeted by queued inserts, in order.
    pub fn inserted_words(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter(|s| s.kind == StatementKind::InsertEntry)
            .filter_map(|s| s.text_param(0))
            .collect()
    }

    /// Append statements compiled elsewhere (e.g. by a per-token pass).
    pub fn extend(&mut self, statements: impl IntoIterator<Item = Statement>) {
        self.statements.extend(statements);
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Insert-or-skip for one entry.
    pub fn insert_entry(
        &mut self,
        word: &str,
        association: Option<&str>,
        transcription: Option<&str>,
    ) {
        let values: Vec<SqlValue> = vec![
            word.into(),
            association.into(),
            self.list_id.into(),
            transcription.into(),
        ];
        let statement = match self.guard {
            Some(guard) => {
                let mut params = values;
                params.extend(guard.params(word));
                Statement::new(
                    StatementKind::InsertEntry,
                    format!(
                        "INSERT INTO {table} (word, used, association, state, list_id, successes, \"IPA_word\", added) \
                         SELECT %s, FALSE, %s, 'New', %s, 0, %s, TRUE \
                         WHERE {guard} \
                         ON CONFLICT (word, list_id) DO NOTHING;",
                        table = ENTRY_TABLE,
                        guard = guard.clause()
                    ),
                    params,
                )
            }
            None => Statement::new(
                StatementKind::InsertEntry,
                format!(
                    "INSERT INTO {} (word, used, association, state, list_id, successes, \"IPA_word\", added) \
                     VALUES (%s, FALSE, %s, 'New', %s, 0, %s, TRUE) \
                     ON CONFLICT (word, list_id) DO NOTHING;",
                    ENTRY_TABLE
                ),
                values,
            ),
        };
        self.statements.push(statement);
    }

    fn guarded_update(
        &mut self,
        kind: StatementKind,
        set_and_filter: String,
        mut params: Vec<SqlValue>,
        word: &str,
    ) {
        let sql = match self.guard {
            Some(guard) => {
                params.extend(guard.params(word));
                format!("{} AND {};", set_and_filter, guard.clause())
            }
            None => format!("{};", set_and_filter),
        };
        self.statements.push(Statement::new(kind, sql, params));
    }

    /// Fill the transcription when still absent.
    pub fn update_transcription(&mut self, word: &str, transcription: Option<&str>) {
        let Some(transcription) = transcription.filter(|t| !t.is_empty()) else {
            return;
        };
        self.guarded_update(
            StatementKind::UpdateTranscription,
            format!(
                "UPDATE {} SET \"IPA_word\" = %s WHERE word = %s AND list_id = %s AND \"IPA_word\" IS NULL",
                ENTRY_TABLE
            ),
            vec![transcription.into(), word.into(), self.list_id.into()],
            word,
        );
    }

    /// Fill the association when absent or empty, optionally repairing
    /// legacy values with more than one comma.
    pub fn update_association(&mut self, word: &str, association: Option<&str>, repair: bool) {
        let Some(association) = association.filter(|a| !a.is_empty()) else {
            return;
        };
        let (kind, condition) = if repair {
            (
                StatementKind::RepairAssociation,
                "(association IS NULL OR association = '' OR association LIKE '%%,%%,%%')",
            )
        } else {
            (
                StatementKind::UpdateAssociation,
                "(association IS NULL OR association = '')",
            )
        };
        self.guarded_update(
            kind,
            format!(
                "UPDATE {} SET association = %s WHERE word = %s AND list_id = %s AND {}",
                ENTRY_TABLE, condition
            ),
            vec![association.into(), word.into(), self.list_id.into()],
            word,
        );
    }

    /// Insert plus both conditional updates for one entry.
    pub fn entry(&mut self, word: &str, association: Option<&str>, transcription: Option<&str>) {
        self.insert_entry(word, association, transcription);
        self.update_transcription(word, transcription);
        self.update_association(word, association, true);
    }

    /// Validate every statement and return the immutable sequence.
    pub fn finalize(self) -> Result<Vec<Statement>> {
        for statement in &self.statements {
            statement.validate()?;
        }
        Ok(self.statements)
    }
}
