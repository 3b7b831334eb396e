//! Transcription requests and their validation.
//!
//! The model's transcription is accepted as-is or dropped: no local repair
//! is ever attempted. A phrase correction proposed alongside it is only
//! taken when it is one of the known elisions.

use lazy_static::lazy_static;
use regex::Regex;

use super::ResolveContext;
use crate::completion::{extract_json_object, field_str, prompts, CompletionRequest};
use crate::error::Result;
use crate::language::normalize::collapse_whitespace;
use crate::language::rules::unify_apostrophes;
use crate::language::tokenize::split_tokens;
use crate::language::LanguageRules;

/// Liaison / linking marker.
pub const LIAISON: char = '‿';

/// Consonants that may stand alone before the liaison marker.
const LIAISON_CONSONANTS: &[char] = &['z', 't', 'n', 'p', 'ʁ', 'r', 'k', 'v', 'g'];

lazy_static! {
    static ref SINGLE_SEGMENT: Regex = Regex::new(r"^/[^/]+/$").unwrap();
}

/// Accept a transcription only if it is one `/…/` segment with no
/// brackets, no control whitespace, no doubled marker and no whitespace
/// next to the liaison marker.
pub fn accept_transcription(raw: &str) -> Option<String> {
    let t = raw.trim();
    if !SINGLE_SEGMENT.is_match(t) {
        return None;
    }
    if t[1..t.len() - 1].trim().is_empty() {
        return None;
    }
    if t.contains(['[', ']', '\n', '\r', '\t']) {
        return None;
    }
    let doubled = format!("{0}{0}", LIAISON);
    if t.contains(&doubled) {
        return None;
    }
    let chars: Vec<char> = t.chars().collect();
    let spaced_liaison = chars.windows(2).any(|w| {
        (w[0] == LIAISON && w[1].is_whitespace()) || (w[1] == LIAISON && w[0].is_whitespace())
    });
    if spaced_liaison {
        return None;
    }
    Some(t.to_string())
}

/// Number of word segments, not counting a lone liaison consonant that
/// is written against the following word (`/vu z‿ɛt/` has two).
pub fn word_segments(transcription: &str) -> usize {
    let inner = transcription.trim().trim_matches('/');
    let mut count = 0;
    for chunk in inner.split_whitespace() {
        let parts: Vec<&str> = chunk.split(LIAISON).collect();
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            let mut chars = part.chars();
            let lone_liaison = matches!(
                (chars.next(), chars.next()),
                (Some(c), None) if LIAISON_CONSONANTS.contains(&c)
            ) && i + 1 < parts.len();
            if !lone_liaison {
                count += 1;
            }
        }
    }
    count
}

/// Full acceptance check for the transcription of `phrase`.
pub fn validate_for_phrase(rules: &LanguageRules, phrase: &str, raw: &str) -> Option<String> {
    let accepted = accept_transcription(raw)?;
    if rules.checks_liaison_segments() {
        let tokens = split_tokens(phrase, rules).len();
        if tokens >= 2 && word_segments(&accepted) != tokens {
            log::warn!(
                "Transcription {} of {:?} has {} segments for {} tokens",
                accepted,
                phrase,
                word_segments(&accepted),
                tokens
            );
            return None;
        }
    }
    Some(accepted)
}

/// A transcribed phrase, possibly corrected by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcribed {
    pub phrase: String,
    pub transcription: Option<String>,
    pub corrected: bool,
}

struct Reply {
    phrase: Option<String>,
    transcription: Option<String>,
}

fn ask(ctx: &mut ResolveContext<'_>, request: &CompletionRequest) -> Result<Reply> {
    log::debug!("completion {} for {:?}", request.kind.as_str(), request.subject);
    let content = ctx.service.complete(request)?;
    Ok(match extract_json_object(&content) {
        Some(map) => Reply {
            phrase: field_str(&map, &["phrase"]),
            transcription: field_str(&map, &["ipa", "transcription"]),
        },
        // A bare `/…/` answer is still usable.
        None => Reply {
            phrase: None,
            transcription: Some(content.trim().to_string()).filter(|c| !c.is_empty()),
        },
    })
}

fn canonical_phrase(rules: &LanguageRules, phrase: &str) -> String {
    let unified = collapse_whitespace(&unify_apostrophes(phrase));
    if rules.lowercase {
        unified.to_lowercase()
    } else {
        unified
    }
}

fn finish(
    ctx: &mut ResolveContext<'_>,
    phrase: String,
    raw: Option<String>,
    corrected: bool,
) -> Transcribed {
    let transcription = raw.and_then(|r| {
        let accepted = validate_for_phrase(ctx.rules, &phrase, &r);
        if accepted.is_none() {
            log::warn!("Rejected transcription {:?} for {:?}", r, phrase);
        }
        accepted
    });
    Transcribed { phrase, transcription, corrected }
}

fn record_rejected_correction(ctx: &mut ResolveContext<'_>, phrase: &str, candidate: &str) {
    log::warn!("Rejected phrase correction {:?} -> {:?}", phrase, candidate);
    ctx.trail.record("rejected_correction", (phrase, candidate));
}

/// Transcribe `article + noun`. Only an elision of `le`/`la` is accepted
/// as a correction.
pub fn noun_phrase(
    ctx: &mut ResolveContext<'_>,
    phrase: &str,
    article: Option<&str>,
    word: &str,
) -> Result<Transcribed> {
    let request = prompts::noun_transcription(ctx.rules, ctx.language, phrase);
    let reply = ask(ctx, &request)?;
    let mut accepted = phrase.to_string();
    let mut corrected = false;
    if let Some(candidate) = reply.phrase.map(|p| canonical_phrase(ctx.rules, &p)) {
        if candidate != phrase {
            let elided = article
                .filter(|a| ctx.rules.is_elidable_article(a))
                .map(|a| ctx.rules.elide_article(a, word))
                .filter(|e| ctx.rules.is_elided_article(e))
                .map(|e| ctx.rules.build_phrase(Some(e.as_str()), word));
            if elided.as_deref() == Some(candidate.as_str()) {
                accepted = candidate;
                corrected = true;
            } else {
                record_rejected_correction(ctx, phrase, &candidate);
            }
        }
    }
    Ok(finish(ctx, accepted, reply.transcription, corrected))
}

/// Transcribe `pronoun + verb form`. Only pronoun elision is accepted as a
/// correction.
pub fn verb_phrase(ctx: &mut ResolveContext<'_>, phrase: &str) -> Result<Transcribed> {
    let request = prompts::verb_transcription(ctx.rules, ctx.language, phrase);
    let reply = ask(ctx, &request)?;
    let mut accepted = phrase.to_string();
    let mut corrected = false;
    if let Some(candidate) = reply.phrase.map(|p| canonical_phrase(ctx.rules, &p)) {
        if candidate != phrase {
            if ctx.rules.elide_pronoun_phrase(phrase).as_deref() == Some(candidate.as_str()) {
                accepted = candidate;
                corrected = true;
            } else {
                record_rejected_correction(ctx, phrase, &candidate);
            }
        }
    }
    Ok(finish(ctx, accepted, reply.transcription, corrected))
}

/// Transcribe text exactly as written. No correction is possible.
pub fn bare(ctx: &mut ResolveContext<'_>, text: &str) -> Result<Option<String>> {
    let request = prompts::phrase_transcription(ctx.rules, ctx.language, text);
    let reply = ask(ctx, &request)?;
    Ok(finish(ctx, text.to_string(), reply.transcription, false).transcription)
}
