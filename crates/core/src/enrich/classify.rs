//! Part-of-speech classification.
//!
//! One token moves through `Unclassified → PrimaryClassified →
//! (FallbackChecked) → Finalized`. The primary pass asks the model; the
//! fallback pass double-checks nouns that look like conjugated verbs; the
//! deterministic overrides run last.

use serde_json::Value;

use super::ResolveContext;
use crate::completion::{field_str, field_value, prompts, query_json};
use crate::error::Result;
use crate::types::{Classification, PosTag};

const ADJECTIVE_ALIASES: &[&str] = &["adjective", "adj", "adjetivo", "adjetive"];
const NOUN_ALIASES: &[&str] = &["noun", "n", "sustantivo", "sustantive"];
const VERB_ALIASES: &[&str] = &["verb", "v", "verbo"];
const COMBINED_MARKERS: &[&str] = &["noun_verb", "nounverb", "noun verb", "verb noun", "both"];

/// Read a `pos` answer given as a string or a list of strings.
pub fn parse_pos(value: Option<&Value>) -> PosTag {
    let raw = match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => return PosTag::Unknown,
    };
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return PosTag::Unknown;
    }

    let combined = COMBINED_MARKERS.iter().any(|m| lowered.contains(m));
    let spaced = lowered.replace(['+', '/', '_', ',', '|'], " ");
    let tokens: Vec<&str> = spaced
        .split_whitespace()
        .filter(|t| *t != "and")
        .collect();

    let adjective = tokens.iter().any(|t| ADJECTIVE_ALIASES.contains(t));
    let noun = combined || tokens.iter().any(|t| NOUN_ALIASES.contains(t));
    let verb = combined || tokens.iter().any(|t| VERB_ALIASES.contains(t));

    if adjective {
        PosTag::Adjective
    } else if noun && verb {
        PosTag::NounVerb
    } else if noun {
        PosTag::Noun
    } else if verb {
        PosTag::Verb
    } else if !tokens.is_empty() {
        PosTag::Other
    } else {
        PosTag::Unknown
    }
}

fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "oui" | "sí" | "si"
        ),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

fn primary_pass(ctx: &mut ResolveContext<'_>, token: &str) -> Result<Classification> {
    let request = prompts::classify(ctx.rules, ctx.language, token);
    let reply = query_json(ctx.service, &request)?;
    let mut classification = Classification::new(PosTag::Unknown);
    if let Some(map) = reply {
        let pos = field_value(&map, &["pos", "part_of_speech"]);
        ctx.trail.record("pos_raw", pos);
        classification.tag = parse_pos(pos);
        classification.lemma = field_str(&map, &["lemma"]);
    }

    if let Some(lemma) = ctx.rules.ambiguous_lemma(token) {
        if classification.tag.is_verb() {
            classification.tag = PosTag::NounVerb;
            classification.lemma.get_or_insert_with(|| lemma.to_string());
        }
    }
    Ok(classification)
}

fn fallback_pass(
    ctx: &mut ResolveContext<'_>,
    token: &str,
    mut classification: Classification,
) -> Result<Classification> {
    if classification.tag != PosTag::Noun || !ctx.rules.looks_like_conjugated_verb(token) {
        return Ok(classification);
    }

    let request = prompts::verb_check(ctx.rules, ctx.language, token);
    let Some(map) = query_json(ctx.service, &request)? else {
        ctx.trail.record("verb_check", "unparsable");
        return Ok(classification);
    };
    let is_verb = parse_flag(map.get("is_verb"));
    ctx.trail.record("verb_check", is_verb);
    if !is_verb {
        return Ok(classification);
    }

    let ambiguous = ctx.rules.ambiguous_lemma(token);
    classification.tag = if ambiguous.is_some() {
        PosTag::NounVerb
    } else {
        PosTag::Verb
    };
    classification.lemma = field_str(&map, &["lemma"])
        .or(classification.lemma)
        .or_else(|| ambiguous.map(str::to_string));
    Ok(classification)
}

fn apply_overrides(
    ctx: &ResolveContext<'_>,
    token: &str,
    mut classification: Classification,
) -> Classification {
    if ctx.rules.is_common_adverb(token) && classification.tag != PosTag::Other {
        log::info!("{:?} is a common adverb, forcing other", token);
        classification.tag = PosTag::Other;
        classification.lemma = None;
    }
    classification
}

/// Classify one token. Service errors propagate; unusable replies finalize to `other`.
pub fn classify(ctx: &mut ResolveContext<'_>, token: &str) -> Result<Classification> {
    let primary = primary_pass(ctx, token)?;
    let checked = fallback_pass(ctx, token, primary)?;
    let mut finalized = apply_overrides(ctx, token, checked);
    finalized.tag = finalized.tag.finalized();
    ctx.trail.record("classification", &finalized);
    log::info!("Classified {:?} as {}", token, finalized.tag.as_str());
    Ok(finalized)
}
