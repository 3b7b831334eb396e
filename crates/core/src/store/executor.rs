//! Running compiled statements against a live store.

use super::compiler::ENTRY_TABLE;
use super::homophones::link_homophones_live;
use super::statement::{SqlValue, Statement, StatementKind};
use crate::config::PipelineConfig;
use crate::enrich::pipeline::with_configured_pipeline;
use crate::enrich::Pipeline;
use crate::error::Result;
use crate::language::rules_for;
use crate::types::{AddWordOutcome, Provenance, WordRequest};

/// A database cursor inside a transaction the caller owns.
///
/// Implementations bind `params` to the `%s` placeholders in order.
/// Errors must be reported as [`crate::Error::Persistence`] so the caller
/// can roll back.
pub trait Cursor {
    /// Run a write statement and return the number of affected rows.
    fn execute(&mut self, statement: &Statement) -> Result<u64>;

    /// Run a read statement and return its rows.
    fn query(&mut self, statement: &Statement) -> Result<Vec<Vec<SqlValue>>>;
}

fn select_entry_id(word: &str, list_id: i64) -> Statement {
    Statement::new(
        StatementKind::SelectEntryId,
        format!("SELECT id FROM {} WHERE word = %s AND list_id = %s;", ENTRY_TABLE),
        vec![word.into(), list_id.into()],
    )
}

/// Execute `statements` in order, stopping at the first failure.
pub fn execute_all<C: Cursor + ?Sized>(cursor: &mut C, statements: &[Statement]) -> Result<u64> {
    let mut affected = 0;
    for statement in statements {
        let rows = cursor.execute(statement)?;
        log::debug!("{:?} affected {} rows", statement.kind, rows);
        affected += rows;
    }
    Ok(affected)
}

/// Row id for `(word, list_id)`, if the row exists.
pub fn lookup_entry_id<C: Cursor + ?Sized>(
    cursor: &mut C,
    word: &str,
    list_id: i64,
) -> Result<Option<i64>> {
    let rows = cursor.query(&select_entry_id(word, list_id))?;
    Ok(rows
        .into_iter()
        .next()
        .and_then(|row| row.first().and_then(SqlValue::as_int)))
}

impl Pipeline<'_> {
    /// Prepare `request`, execute every statement, then link homophones
    /// against the stored rows and look up the entry id.
    ///
    /// Nothing is committed here. On error the caller rolls back.
    pub fn add_word<C: Cursor + ?Sized>(
        &self,
        cursor: &mut C,
        request: &WordRequest,
    ) -> Result<AddWordOutcome> {
        let actions = self.prepare(request)?;
        let affected = execute_all(cursor, &actions.queries)?;
        log::info!(
            "Executed {} statements for {:?} ({} rows affected)",
            actions.queries.len(),
            actions.canonical_word,
            affected
        );

        let primary = actions.primary_word().to_string();
        if self.config().link_homophones {
            let rules = rules_for(&request.language.trim().to_lowercase());
            link_homophones_live(cursor, rules, actions.list_id, &primary)?;
        }

        let entry_id = lookup_entry_id(cursor, &primary, actions.list_id)?;
        if entry_id.is_none() {
            log::warn!("No stored row for {:?} after insert (rejected word?)", primary);
        }

        Ok(AddWordOutcome {
            entry_id,
            is_verb: actions.is_verb(),
            association: actions.association,
            transcription: actions.transcription,
            provenance: Provenance::current(self.model()),
        })
    }
}

/// [`Pipeline::add_word`] with a client built from `config`.
pub fn add_word<C: Cursor + ?Sized>(
    cursor: &mut C,
    request: &WordRequest,
    config: &PipelineConfig,
) -> Result<AddWordOutcome> {
    with_configured_pipeline(request, config, |pipeline| pipeline.add_word(cursor, request))
}
