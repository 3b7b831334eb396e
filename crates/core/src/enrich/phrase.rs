//! Multi-token input.
//!
//! Every token goes through the single-token pipeline first; the whole
//! phrase is then stored once more under its storage-safe key.

use std::collections::VecDeque;

use serde_json::json;

use super::phonetic;
use super::pipeline::{Invocation, Pipeline};
use super::{DebugTrail, ResolveContext};
use crate::completion::{field_str, prompts, query_json};
use crate::error::Result;
use crate::language::normalize::{clean_sentence, storage_safe};
use crate::language::tokenize::tokenize;
use crate::store::compiler::StatementBuilder;
use crate::types::ActionSet;

/// Resolve each token of `normalized`, then compile the phrase row.
///
/// The phrase row gets no insert when a per-token pass already queued one
/// for the same key, but both fill-if-empty updates are always emitted.
pub(crate) fn decompose(
    pipeline: &Pipeline<'_>,
    inv: &Invocation<'_>,
    normalized: &str,
) -> Result<ActionSet> {
    let storage = storage_safe(normalized, inv.rules);
    let tokens = tokenize(normalized, inv.rules);
    log::info!("Decomposing {:?} into {} tokens", normalized, tokens.len());

    let mut trail = DebugTrail::new();
    trail.record("input", normalized);
    trail.record("storage", &storage);
    trail.record("tokens", &tokens);

    let mut builder = StatementBuilder::new(inv.list_id, inv.guard);
    let mut queue: VecDeque<&str> = tokens.iter().map(String::as_str).collect();
    let mut token_actions = Vec::with_capacity(tokens.len());
    while let Some(token) = queue.pop_front() {
        let actions = pipeline.resolve_token(inv, token)?;
        token_actions.push(json!({
            "token": token,
            "canonical": actions.canonical_word,
            "pos": actions.pos,
            "association": actions.association,
            "debug": actions.debug_info,
        }));
        builder.extend(actions.queries);
    }
    trail.record("token_actions", token_actions);

    let (translation, transcription) = match pipeline.service() {
        Some(service) => {
            let request = prompts::phrase_translation(inv.rules, inv.language, normalized);
            // Keep the stored association to a single comma.
            let translation = query_json(service, &request)?
                .and_then(|map| field_str(&map, &["translation"]))
                .and_then(|t| clean_sentence(&t))
                .map(|t| t.replace(',', ";"));
            let mut ctx = ResolveContext::new(service, inv.rules, inv.language, pipeline.config());
            let transcription = phonetic::bare(&mut ctx, normalized)?;
            trail.record("phrase", ctx.trail.into_value());
            (translation, transcription)
        }
        None => (None, None),
    };

    let association = translation.as_ref().map(|t| format!("{}, {}", storage, t));
    if builder.has_insert_for(&storage) {
        log::debug!("Insert for {:?} already queued by a token pass", storage);
        trail.record("phrase_insert", "skipped");
    } else {
        builder.insert_entry(&storage, association.as_deref(), transcription.as_deref());
    }
    builder.update_transcription(&storage, transcription.as_deref());
    builder.update_association(&storage, association.as_deref(), false);

    Ok(ActionSet {
        canonical_word: storage,
        list_id: inv.list_id,
        pos: None,
        is_phrase: true,
        association,
        transcription,
        lemma: None,
        tense: None,
        entries: Vec::new(),
        tokens,
        queries: builder.finalize()?,
        debug_info: trail.into_value(),
    })
}
