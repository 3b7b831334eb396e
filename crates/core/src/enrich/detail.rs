//! Per-tag detail resolution.
//!
//! Each terminal [`PosTag`] has its own [`DetailResolver`]. Adding a
//! grammatical category means adding a [`Detail`] variant and a resolver.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::ResolveContext;
use crate::completion::{field_str, field_value, prompts, query_json};
use crate::error::Result;
use crate::language::normalize::{
    clean_translation, collapse_whitespace, first_clause, normalize_user_text,
};
use crate::language::rules::{parse_gender_label, unify_apostrophes};
use crate::language::LanguageRules;
use crate::types::{
    AdjectiveDetail, Classification, NounDetail, PosTag, VerbDetail, VerbParadigmEntry,
};

/// Resolved details of one token, tagged by its final category.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Noun(NounDetail),
    Adjective(AdjectiveDetail),
    Verb(VerbDetail),
    NounVerb(NounDetail, VerbDetail),
    Other { translation: Option<String> },
}

impl Detail {
    /// Tag after any override applied during resolution.
    pub fn tag(&self) -> PosTag {
        match self {
            Detail::Noun(_) => PosTag::Noun,
            Detail::Adjective(_) => PosTag::Adjective,
            Detail::Verb(_) => PosTag::Verb,
            Detail::NounVerb(..) => PosTag::NounVerb,
            Detail::Other { .. } => PosTag::Other,
        }
    }
}

pub trait DetailResolver {
    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        word: &str,
        classification: &Classification,
    ) -> Result<Detail>;
}

pub struct NounResolver;
pub struct AdjectiveResolver;
pub struct OtherResolver;

pub struct VerbResolver {
    pub expand: bool,
}

pub struct NounVerbResolver {
    pub expand: bool,
}

/// Resolver for a finalized tag. `Unknown` is treated as `Other`.
pub fn resolver_for(tag: PosTag, expand_verbs: bool) -> Box<dyn DetailResolver> {
    match tag.finalized() {
        PosTag::Noun => Box::new(NounResolver),
        PosTag::Adjective => Box::new(AdjectiveResolver),
        PosTag::Verb => Box::new(VerbResolver { expand: expand_verbs }),
        PosTag::NounVerb => Box::new(NounVerbResolver { expand: expand_verbs }),
        PosTag::Other | PosTag::Unknown => Box::new(OtherResolver),
    }
}

// ─── Nouns ──────────────────────────────────────────────────────────

/// Merge article, base article and gender from one reply into `detail`.
fn apply_article(
    rules: &LanguageRules,
    word: &str,
    map: &Map<String, Value>,
    detail: &mut NounDetail,
) {
    let article = field_str(map, &["article"]).and_then(|a| rules.normalize_article(&a));
    let base = field_str(map, &["base_article", "article_base"])
        .and_then(|b| rules.normalize_article(&b))
        .filter(|b| !rules.is_elided_article(b));
    let gender = base
        .as_deref()
        .and_then(|b| rules.gender_for_article(b))
        .or_else(|| field_str(map, &["gender", "genre"]).and_then(|g| parse_gender_label(&g)))
        .or_else(|| article.as_deref().and_then(|a| rules.gender_for_article(a)));

    if let Some(article) = article {
        let elided = rules.elide_article(&article, word);
        if detail.base_article.is_none() && base.is_none() && rules.is_elidable_article(&article) {
            detail.base_article = Some(article.clone());
        }
        detail.article = Some(elided);
    }
    if base.is_some() {
        detail.base_article = base;
    }
    if gender.is_some() {
        detail.gender = gender;
    }
}

fn resolve_noun(ctx: &mut ResolveContext<'_>, word: &str) -> Result<NounDetail> {
    let mut detail = NounDetail::default();
    let request = prompts::noun_detail(ctx.rules, ctx.language, word);
    let Some(map) = query_json(ctx.service, &request)? else {
        return Ok(detail);
    };
    detail.translation = field_str(&map, &["translation"]).and_then(|t| clean_translation(&t));
    apply_article(ctx.rules, word, &map, &mut detail);

    if detail.article.is_none() && ctx.rules.retries_missing_article() {
        log::info!("No article for {:?}, retrying once", word);
        let retry = prompts::article_retry(ctx.rules, ctx.language, word);
        if let Some(map) = query_json(ctx.service, &retry)? {
            apply_article(ctx.rules, word, &map, &mut detail);
        }
        ctx.trail.record("article_retry", &detail.article);
    }
    ctx.trail.record("noun", &detail);
    Ok(detail)
}

/// Adverb translated as a noun (`rapidement` → `rápidamente` with an article).
fn is_adverbial_noun(rules: &LanguageRules, detail: &NounDetail) -> bool {
    detail.article.is_some()
        && detail
            .translation
            .as_deref()
            .map(|t| rules.has_adverbial_translation(t))
            .unwrap_or(false)
}

impl DetailResolver for NounResolver {
    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        word: &str,
        _: &Classification,
    ) -> Result<Detail> {
        let noun = resolve_noun(ctx, word)?;
        if is_adverbial_noun(ctx.rules, &noun) {
            log::info!("{:?} translates as an adverb, forcing other", word);
            ctx.trail.record("adverbial_override", true);
            return Ok(Detail::Other { translation: noun.translation });
        }
        Ok(Detail::Noun(noun))
    }
}

// ─── Adjectives ─────────────────────────────────────────────────────

impl AdjectiveDetail {
    /// Feminine form when it departs from the regular suffix rule.
    pub fn irregular_feminine(&self, rules: &LanguageRules, word: &str) -> Option<String> {
        let feminine = self.feminine.as_deref().filter(|f| !f.is_empty())?;
        if feminine == word {
            return None;
        }
        let regular = normalize_user_text(&rules.default_feminine(word)?, rules);
        if regular == feminine {
            None
        } else {
            Some(feminine.to_string())
        }
    }
}

impl DetailResolver for AdjectiveResolver {
    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        word: &str,
        _: &Classification,
    ) -> Result<Detail> {
        let request = prompts::adjective_detail(ctx.rules, ctx.language, word);
        let mut detail = AdjectiveDetail::default();
        if let Some(map) = query_json(ctx.service, &request)? {
            detail.translation =
                field_str(&map, &["translation"]).and_then(|t| clean_translation(&t));
            detail.feminine = field_str(&map, &["feminine", "feminine_form"])
                .map(|f| normalize_user_text(&f, ctx.rules))
                .filter(|f| !f.is_empty());
            detail.feminine_translation =
                field_str(&map, &["feminine_translation"]).and_then(|t| clean_translation(&t));
        }
        ctx.trail.record("adjective", &detail);
        Ok(Detail::Adjective(detail))
    }
}

// ─── Other ──────────────────────────────────────────────────────────

impl DetailResolver for OtherResolver {
    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        word: &str,
        _: &Classification,
    ) -> Result<Detail> {
        let request = prompts::other_detail(ctx.rules, ctx.language, word);
        let translation = query_json(ctx.service, &request)?
            .and_then(|map| field_str(&map, &["translation"]))
            .and_then(|t| clean_translation(&t));
        ctx.trail.record("translation", &translation);
        Ok(Detail::Other { translation })
    }
}

// ─── Verbs ──────────────────────────────────────────────────────────

fn parse_forms(rules: &LanguageRules, value: Option<&Value>) -> Vec<VerbParadigmEntry> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let pronoun = field_str(item, &["pronoun"]).unwrap_or_default();
            let phrase = match field_str(item, &["phrase"]) {
                Some(p) => p,
                None => rules.verb_phrase(&pronoun, &field_str(item, &["form"])?),
            };
            let mut phrase = collapse_whitespace(&unify_apostrophes(&phrase));
            if rules.lowercase {
                phrase = phrase.to_lowercase();
            }
            if phrase.is_empty() {
                return None;
            }
            let translation = field_str(item, &["translation"]).and_then(|t| first_clause(&t));
            Some(VerbParadigmEntry::new(&pronoun, &phrase, translation))
        })
        .collect()
}

/// Collapse slots of one pronoun group (`il`, `elle`, `on`) into one when
/// their verb-form text is identical.
pub fn merge_pronoun_groups(
    rules: &LanguageRules,
    entries: Vec<VerbParadigmEntry>,
) -> Vec<VerbParadigmEntry> {
    let key_of = |entry: &VerbParadigmEntry| -> Option<(&'static str, String)> {
        let (head, rest) = entry.phrase.split_once(' ')?;
        let group = rules.pronoun_group(head)?;
        Some((group, rest.trim().to_string()))
    };

    let mut members: HashMap<(&'static str, String), usize> = HashMap::new();
    for entry in &entries {
        if let Some(key) = key_of(entry) {
            *members.entry(key).or_insert(0) += 1;
        }
    }

    let mut merged: Vec<VerbParadigmEntry> = Vec::new();
    let mut slot_of: HashMap<(&'static str, String), usize> = HashMap::new();
    for entry in entries {
        let key = match key_of(&entry) {
            Some(key) if members.get(&key).copied().unwrap_or(0) > 1 => key,
            _ => {
                merged.push(entry);
                continue;
            }
        };
        match slot_of.get(&key) {
            Some(&index) => {
                let slot = &mut merged[index];
                if slot.translation.as_deref().map(str::is_empty).unwrap_or(true) {
                    slot.translation = entry.translation;
                }
            }
            None => {
                let phrase = format!("{} {}", key.0, key.1);
                slot_of.insert(key.clone(), merged.len());
                merged.push(VerbParadigmEntry::new(key.0, &phrase, entry.translation));
            }
        }
    }
    merged
}

fn resolve_verb(
    ctx: &mut ResolveContext<'_>,
    word: &str,
    classification: &Classification,
    expand: bool,
) -> Result<VerbDetail> {
    let mut detail = VerbDetail {
        tense: None,
        lemma: classification.lemma.clone().filter(|l| !l.is_empty()),
        entries: Vec::new(),
    };
    if !expand {
        detail.entries.push(VerbParadigmEntry::new("", word, None));
        return Ok(detail);
    }

    let request = prompts::verb_detail(ctx.rules, ctx.language, word, detail.lemma.as_deref());
    let mut infinitive_translation = None;
    if let Some(map) = query_json(ctx.service, &request)? {
        detail.tense = field_str(&map, &["tense"]);
        infinitive_translation =
            field_str(&map, &["infinitive_translation"]).and_then(|t| clean_translation(&t));
        if detail.lemma.is_none() {
            detail.lemma = field_str(&map, &["lemma", "infinitive"]);
        }
        detail.entries = parse_forms(ctx.rules, field_value(&map, &["forms", "conjugations"]));
    }

    if ctx.config.merge_ambiguous_pronouns {
        detail.entries = merge_pronoun_groups(ctx.rules, detail.entries);
    }
    if detail.entries.is_empty() {
        detail.entries.push(VerbParadigmEntry::new("", word, None));
    }
    if let Some(lemma) = detail.lemma.clone() {
        if !detail.entries.iter().any(|e| e.phrase == lemma) {
            let translation = match infinitive_translation {
                Some(t) => format!("{} (infinitivo)", t),
                None => "(infinitivo)".to_string(),
            };
            detail
                .entries
                .push(VerbParadigmEntry::new("infinitive", &lemma, Some(translation)));
        }
    }

    ctx.trail.record("tense", &detail.tense);
    ctx.trail.record("paradigm_size", detail.entries.len());
    Ok(detail)
}

impl DetailResolver for VerbResolver {
    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        word: &str,
        classification: &Classification,
    ) -> Result<Detail> {
        Ok(Detail::Verb(resolve_verb(ctx, word, classification, self.expand)?))
    }
}

impl DetailResolver for NounVerbResolver {
    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        word: &str,
        classification: &Classification,
    ) -> Result<Detail> {
        let noun = resolve_noun(ctx, word)?;
        let verb = resolve_verb(ctx, word, classification, self.expand)?;
        if is_adverbial_noun(ctx.rules, &noun) {
            ctx.trail.record("adverbial_override", true);
            return Ok(Detail::Verb(verb));
        }
        Ok(Detail::NounVerb(noun, verb))
    }
}
