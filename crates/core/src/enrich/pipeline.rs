//! Pipeline entry points.
//!
//! [`Pipeline::prepare`] turns one request into an [`ActionSet`]: the
//! resolved word data plus the ordered statements that persist it. Nothing
//! is written here; executing the statements is the caller's business (or
//! `add_word`'s).

use serde_json::json;

use super::classify::classify;
use super::detail::{resolver_for, Detail};
use super::phonetic;
use super::phrase;
use super::{DebugTrail, ResolveContext};
use crate::completion::CompletionService;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::language::normalize::normalize_user_text;
use crate::language::tokenize::{is_multi_token, tokenize};
use crate::language::{rules_for, LanguageRules};
use crate::store::compiler::{RejectedWordsGuard, StatementBuilder};
use crate::store::homophones::link_statements;
use crate::types::{ActionSet, EntryPlan, NounDetail, PosTag, VerbParadigmEntry, WordRequest};

/// Per-call settings shared by every token of one request.
pub(crate) struct Invocation<'a> {
    pub rules: &'static LanguageRules,
    pub language: &'a str,
    pub list_id: i64,
    pub expand_verbs: bool,
    pub link_homophones: bool,
    pub guard: Option<&'a RejectedWordsGuard>,
}

/// What realizing a detail produced, besides statements.
#[derive(Default)]
struct Realized {
    association: Option<String>,
    transcription: Option<String>,
    lemma: Option<String>,
    tense: Option<String>,
    entries: Vec<VerbParadigmEntry>,
    extras: Vec<EntryPlan>,
}

pub struct Pipeline<'a> {
    service: Option<&'a dyn CompletionService>,
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    /// Without a service the pipeline still compiles bare inserts.
    pub fn new(service: Option<&'a dyn CompletionService>, config: &'a PipelineConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &'a PipelineConfig {
        self.config
    }

    pub fn service(&self) -> Option<&'a dyn CompletionService> {
        self.service
    }

    /// Model recorded in provenance.
    pub fn model(&self) -> &str {
        match self.service {
            Some(service) => service.model(),
            None => &self.config.model,
        }
    }

    /// Resolve a word or phrase and compile its statements.
    ///
    /// The rejected-words guard is validated before any completion request
    /// is made. Input that normalizes to nothing is rejected.
    pub fn prepare(&self, request: &WordRequest) -> Result<ActionSet> {
        let language = request.language.trim().to_lowercase();
        let rules = rules_for(&language);
        let table = request
            .rejected_words_table
            .as_deref()
            .or(self.config.rejected_words_table.as_deref());
        let guard = RejectedWordsGuard::resolve(table, request.user_id.as_deref(), &language)?;

        let normalized = normalize_user_text(&request.word, rules);
        if normalized.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{:?} is empty after normalization",
                request.word
            )));
        }

        let invocation = Invocation {
            rules,
            language: &language,
            list_id: request.list_id,
            expand_verbs: request.expand_verbs,
            link_homophones: self.config.link_homophones,
            guard: guard.as_ref(),
        };
        let actions = if is_multi_token(&normalized) {
            phrase::decompose(self, &invocation, &normalized)?
        } else {
            let token = tokenize(&normalized, rules)
                .into_iter()
                .next()
                .unwrap_or_else(|| normalized.clone());
            self.resolve_token(&invocation, &token)?
        };

        log::info!(
            "Prepared {:?} ({}): {} statements",
            actions.canonical_word,
            actions.pos.map(PosTag::as_str).unwrap_or("phrase"),
            actions.queries.len()
        );
        if self.config.debug {
            log::info!("debug_info: {}", actions.debug_info);
        }
        Ok(actions)
    }

    /// Full single-token pass: classify, resolve details, transcribe, compile.
    pub(crate) fn resolve_token(&self, inv: &Invocation<'_>, token: &str) -> Result<ActionSet> {
        let mut builder = StatementBuilder::new(inv.list_id, inv.guard);

        let Some(service) = self.service else {
            log::warn!("No completion service configured, storing {:?} unenriched", token);
            builder.entry(token, None, None);
            let mut trail = DebugTrail::new();
            trail.record("input", token);
            trail.record("enriched", false);
            return Ok(ActionSet {
                canonical_word: token.to_string(),
                list_id: inv.list_id,
                pos: Some(PosTag::Other),
                is_phrase: false,
                association: None,
                transcription: None,
                lemma: None,
                tense: None,
                entries: Vec::new(),
                tokens: vec![token.to_string()],
                queries: builder.finalize()?,
                debug_info: trail.into_value(),
            });
        };

        let mut ctx = ResolveContext::new(service, inv.rules, inv.language, self.config);
        ctx.trail.record("input", token);

        let classification = classify(&mut ctx, token)?;
        let mut word = token.to_string();
        if classification.tag == PosTag::Noun {
            if let Some(singular) = inv.rules.singular_candidate(&word) {
                log::info!("Using singular {:?} for {:?}", singular, word);
                ctx.trail.record("singular", &singular);
                word = singular;
            }
        }

        let detail = resolver_for(classification.tag, inv.expand_verbs).resolve(
            &mut ctx,
            &word,
            &classification,
        )?;
        let pos = detail.tag();
        let mut realized = realize(&mut ctx, inv, &word, detail, &mut builder)?;
        if realized.lemma.is_none() {
            realized.lemma = classification.lemma.clone();
        }

        let rows: Vec<_> = builder
            .inserted_words()
            .into_iter()
            .map(|w| json!({"word": w, "base": word}))
            .collect();
        ctx.trail.record("pos", pos);
        ctx.trail.record("rows", rows);
        ctx.trail.record("extra_entries", &realized.extras);

        Ok(ActionSet {
            canonical_word: word.clone(),
            list_id: inv.list_id,
            pos: Some(pos),
            is_phrase: false,
            association: realized.association,
            transcription: realized.transcription,
            lemma: realized.lemma,
            tense: realized.tense,
            entries: realized.entries,
            tokens: vec![word],
            queries: builder.finalize()?,
            debug_info: ctx.trail.into_value(),
        })
    }
}

fn link(
    builder: &mut StatementBuilder<'_>,
    inv: &Invocation<'_>,
    word: &str,
    transcription: Option<&str>,
) {
    if !inv.link_homophones {
        return;
    }
    builder.extend(link_statements(inv.rules, inv.list_id, word, transcription));
}

/// Stored noun row: `l'ami (m), amigo` under the word `ami`.
fn noun_row(
    ctx: &mut ResolveContext<'_>,
    inv: &Invocation<'_>,
    word: &str,
    noun: &NounDetail,
    builder: &mut StatementBuilder<'_>,
) -> Result<(Option<String>, Option<String>)> {
    let rules = inv.rules;
    let phrase = rules.build_phrase(noun.article.as_deref(), word);
    let transcribed = phonetic::noun_phrase(ctx, &phrase, noun.article.as_deref(), word)?;
    let article = match noun.article.as_deref() {
        Some(a) if transcribed.corrected => Some(rules.elide_article(a, word)),
        other => other.map(str::to_string),
    };
    let stored = rules.mark_gender(&transcribed.phrase, article.as_deref(), noun.gender);
    let association = noun.translation.as_ref().map(|t| format!("{}, {}", stored, t));
    builder.entry(word, association.as_deref(), transcribed.transcription.as_deref());
    link(builder, inv, word, transcribed.transcription.as_deref());
    Ok((association, transcribed.transcription))
}

/// Transcribe every paradigm slot and compile one row per slot.
fn paradigm_rows(
    ctx: &mut ResolveContext<'_>,
    entries: Vec<VerbParadigmEntry>,
    builder: &mut StatementBuilder<'_>,
) -> Result<Vec<VerbParadigmEntry>> {
    let mut transcribed_entries = Vec::with_capacity(entries.len());
    for mut entry in entries {
        let transcribed = phonetic::verb_phrase(ctx, &entry.phrase)?;
        entry.phrase = transcribed.phrase;
        entry.transcription = transcribed.transcription;
        builder.entry(
            &entry.phrase,
            entry.association().as_deref(),
            entry.transcription.as_deref(),
        );
        transcribed_entries.push(entry);
    }
    Ok(transcribed_entries)
}

fn realize(
    ctx: &mut ResolveContext<'_>,
    inv: &Invocation<'_>,
    word: &str,
    detail: Detail,
    builder: &mut StatementBuilder<'_>,
) -> Result<Realized> {
    let mut realized = Realized::default();
    match detail {
        Detail::Noun(noun) => {
            let (association, transcription) = noun_row(ctx, inv, word, &noun, builder)?;
            realized.association = association;
            realized.transcription = transcription;
        }
        Detail::Adjective(adjective) => {
            let transcription = phonetic::bare(ctx, word)?;
            let association = adjective.translation.as_ref().map(|t| format!("{}, {}", word, t));
            builder.entry(word, association.as_deref(), transcription.as_deref());

            if let Some(feminine) = adjective.irregular_feminine(inv.rules, word) {
                let fem_transcription = phonetic::bare(ctx, &feminine)?;
                let fem_association = adjective
                    .feminine_translation
                    .as_ref()
                    .or(adjective.translation.as_ref())
                    .map(|t| format!("{}, {}", feminine, t));
                builder.entry(&feminine, fem_association.as_deref(), fem_transcription.as_deref());
                link(builder, inv, word, transcription.as_deref());
                link(builder, inv, &feminine, fem_transcription.as_deref());
                realized.extras.push(EntryPlan {
                    word: feminine,
                    association: fem_association,
                    transcription: fem_transcription,
                });
            } else {
                link(builder, inv, word, transcription.as_deref());
            }
            realized.association = association;
            realized.transcription = transcription;
        }
        Detail::Other { translation } => {
            let transcription = phonetic::bare(ctx, word)?;
            let association = translation.map(|t| format!("{}, {}", word, t));
            builder.entry(word, association.as_deref(), transcription.as_deref());
            link(builder, inv, word, transcription.as_deref());
            realized.association = association;
            realized.transcription = transcription;
        }
        Detail::Verb(verb) => {
            let entries = paradigm_rows(ctx, verb.entries, builder)?;
            if let Some(first) = entries.first() {
                realized.association = first.association();
                realized.transcription = first.transcription.clone();
            }
            realized.entries = entries;
            realized.lemma = verb.lemma;
            realized.tense = verb.tense;
        }
        Detail::NounVerb(noun, verb) => {
            let (association, transcription) = noun_row(ctx, inv, word, &noun, builder)?;
            realized.association = association;
            realized.transcription = transcription;
            realized.entries = paradigm_rows(ctx, verb.entries, builder)?;
            realized.lemma = verb.lemma;
            realized.tense = verb.tense;
        }
    }
    Ok(realized)
}

/// Run `f` with a pipeline backed by the configured completion client.
///
/// The request's API key wins over the configured one. Without any key the
/// pipeline runs offline and words are stored unenriched.
pub(crate) fn with_configured_pipeline<R>(
    request: &WordRequest,
    config: &PipelineConfig,
    f: impl FnOnce(&Pipeline<'_>) -> Result<R>,
) -> Result<R> {
    let api_key = request.api_key.as_deref().or(config.api_key.as_deref());

    #[cfg(feature = "openai")]
    if let Some(key) = api_key {
        let client = crate::completion::openai::OpenAiClient::from_config(config, key)?;
        return f(&Pipeline::new(Some(&client), config));
    }

    #[cfg(not(feature = "openai"))]
    if api_key.is_some() {
        log::warn!("Built without the openai feature, ignoring API key");
    }

    f(&Pipeline::new(None, config))
}

/// Resolve `request` and compile its statements without touching storage.
pub fn prepare_word_actions(request: &WordRequest, config: &PipelineConfig) -> Result<ActionSet> {
    with_configured_pipeline(request, config, |pipeline| pipeline.prepare(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::QueryKind;
    use crate::store::statement::{SqlValue, StatementKind};
    use crate::test_support::{etre_present_forms, ScriptedCompletion};
    use serde_json::json;

    fn prepare(service: &ScriptedCompletion, request: &WordRequest) -> ActionSet {
        let config = PipelineConfig::default();
        Pipeline::new(Some(service), &config).prepare(request).unwrap()
    }

    fn inserted(actions: &ActionSet) -> Vec<String> {
        actions
            .queries
            .iter()
            .filter(|q| q.kind == StatementKind::InsertEntry)
            .map(|q| q.text_param(0).unwrap().to_string())
            .collect()
    }

    fn ami_script() -> ScriptedCompletion {
        ScriptedCompletion::new()
            .reply(QueryKind::Classify, "ami", json!({"pos": "noun", "lemma": "ami"}))
            .reply(
                QueryKind::NounDetail,
                "ami",
                json!({"translation": "amigo", "article": "l'", "base_article": "le", "gender": "m"}),
            )
            .reply(QueryKind::NounTranscription, "l'ami", json!({"phrase": "l'ami", "ipa": "/l‿ami/"}))
    }

    #[test]
    fn test_noun_association_with_gender_marker() {
        let service = ami_script();
        let actions = prepare(&service, &WordRequest::new("Ami", 1, "fr"));
        assert_eq!(actions.canonical_word, "ami");
        assert_eq!(actions.pos, Some(PosTag::Noun));
        assert_eq!(actions.association.as_deref(), Some("l'ami (m), amigo"));
        assert_eq!(actions.transcription.as_deref(), Some("/l‿ami/"));
        assert_eq!(inserted(&actions), vec!["ami"]);
        let kinds: Vec<_> = actions.queries.iter().map(|q| q.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StatementKind::InsertEntry,
                StatementKind::UpdateTranscription,
                StatementKind::RepairAssociation,
                StatementKind::LinkHomophonesSelf,
                StatementKind::LinkHomophonesPeers,
            ]
        );
    }

    #[test]
    fn test_linking_disabled_emits_no_link_statements() {
        let service = ami_script();
        let config = PipelineConfig { link_homophones: false, ..PipelineConfig::default() };
        let actions = Pipeline::new(Some(&service), &config)
            .prepare(&WordRequest::new("ami", 1, "fr"))
            .unwrap();
        assert_eq!(actions.queries.len(), 3);
    }

    #[test]
    fn test_every_statement_balances_placeholders() {
        let service = ami_script();
        let actions = prepare(&service, &WordRequest::new("ami", 1, "fr"));
        for q in &actions.queries {
            q.validate().unwrap();
        }
    }

    #[test]
    fn test_verb_paradigm_rows() {
        let mut service = ScriptedCompletion::new()
            .reply(QueryKind::Classify, "sommes", json!({"pos": "noun"}))
            .reply(QueryKind::VerbCheck, "sommes", json!({"is_verb": true, "lemma": "être"}))
            .reply(
                QueryKind::VerbDetail,
                "sommes",
                json!({"tense": "présent", "infinitive_translation": "ser", "forms": etre_present_forms()}),
            );
        for (phrase, ipa) in [
            ("je suis", "/ʒə sɥi/"),
            ("tu es", "/ty ɛ/"),
            ("il est", "/il ɛ/"),
            ("elle est", "/ɛl ɛ/"),
            ("on est", "/ɔ̃ n‿ɛ/"),
            ("nous sommes", "/nu sɔm/"),
            ("vous êtes", "/vu z‿ɛt/"),
            ("ils sont", "/il sɔ̃/"),
            ("elles sont", "/ɛl sɔ̃/"),
            ("être", "/ɛtʁ/"),
        ] {
            service = service.reply(QueryKind::VerbTranscription, phrase, json!({"phrase": phrase, "ipa": ipa}));
        }

        let actions = prepare(&service, &WordRequest::new("sommes", 1, "fr"));
        assert_eq!(actions.pos, Some(PosTag::Verb));
        assert!(actions.is_verb());
        assert_eq!(actions.entries.len(), 10);
        assert_eq!(actions.association.as_deref(), Some("je suis, soy"));
        assert_eq!(actions.transcription.as_deref(), Some("/ʒə sɥi/"));
        assert_eq!(actions.primary_word(), "je suis");
        assert_eq!(actions.lemma.as_deref(), Some("être"));

        let words = inserted(&actions);
        assert_eq!(words.len(), 10);
        assert!(!words.contains(&"sommes".to_string()));
        assert_eq!(words.last().map(String::as_str), Some("être"));
        assert!(actions.entries.iter().all(|e| e.transcription.is_some()));
        assert_eq!(service.calls_of(QueryKind::VerbTranscription), 10);
    }

    #[test]
    fn test_adjective_irregular_feminine_adds_row() {
        let service = ScriptedCompletion::new()
            .reply(QueryKind::Classify, "beau", json!({"pos": "adjective"}))
            .reply(
                QueryKind::AdjectiveDetail,
                "beau",
                json!({"translation": "bonito", "feminine": "belle", "feminine_translation": "bonita"}),
            )
            .reply(QueryKind::PhraseTranscription, "beau", json!({"ipa": "/bo/"}))
            .reply(QueryKind::PhraseTranscription, "belle", json!({"ipa": "/bɛl/"}));
        let actions = prepare(&service, &WordRequest::new("beau", 1, "fr"));
        assert_eq!(inserted(&actions), vec!["beau", "belle"]);
        assert_eq!(actions.association.as_deref(), Some("beau, bonito"));
        let belle = actions
            .queries
            .iter()
            .find(|q| q.kind == StatementKind::InsertEntry && q.text_param(0) == Some("belle"))
            .unwrap();
        assert_eq!(belle.params[1], SqlValue::Text("belle, bonita".to_string()));
        assert_eq!(belle.params[3], SqlValue::Text("/bɛl/".to_string()));
    }

    #[test]
    fn test_adjective_regular_feminine_single_row() {
        let service = ScriptedCompletion::new()
            .reply(QueryKind::Classify, "grand", json!({"pos": "adjective"}))
            .reply(
                QueryKind::AdjectiveDetail,
                "grand",
                json!({"translation": "grande", "feminine": "grande", "feminine_translation": "grande"}),
            )
            .reply(QueryKind::PhraseTranscription, "grand", json!({"ipa": "/ɡʁɑ̃/"}));
        let actions = prepare(&service, &WordRequest::new("grand", 1, "fr"));
        assert_eq!(inserted(&actions), vec!["grand"]);
    }

    #[test]
    fn test_regular_plural_singularized() {
        let service = ScriptedCompletion::new()
            .reply(QueryKind::Classify, "livres", json!({"pos": "noun", "lemma": "livre"}))
            .reply(QueryKind::VerbCheck, "livres", json!({"is_verb": false}))
            .reply(QueryKind::NounDetail, "livre", json!({"translation": "libro", "article": "le", "gender": "m"}))
            .reply(QueryKind::NounTranscription, "le livre", json!({"phrase": "le livre", "ipa": "/lə livʁ/"}));
        let actions = prepare(&service, &WordRequest::new("livres", 1, "fr"));
        assert_eq!(actions.canonical_word, "livre");
        assert_eq!(actions.association.as_deref(), Some("le livre, libro"));
        assert_eq!(inserted(&actions), vec!["livre"]);
    }

    #[test]
    fn test_irregular_plural_left_alone() {
        let service = ScriptedCompletion::new()
            .reply(QueryKind::Classify, "travaux", json!({"pos": "noun"}))
            .reply(QueryKind::NounDetail, "travaux", json!({"translation": "obras", "article": "les"}))
            .reply(QueryKind::NounTranscription, "les travaux", json!({"ipa": "/le tʁavo/"}));
        let actions = prepare(&service, &WordRequest::new("travaux", 1, "fr"));
        assert_eq!(actions.canonical_word, "travaux");
        assert_eq!(actions.association.as_deref(), Some("les travaux, obras"));
    }

    #[test]
    fn test_adverb_override_and_mente_override() {
        let service = ScriptedCompletion::new()
            .reply(QueryKind::Classify, "tard", json!({"pos": "noun"}))
            .reply(QueryKind::OtherDetail, "tard", json!({"translation": "tarde"}))
            .reply(QueryKind::PhraseTranscription, "tard", json!({"ipa": "/taʁ/"}));
        let actions = prepare(&service, &WordRequest::new("tard", 1, "fr"));
        assert_eq!(actions.pos, Some(PosTag::Other));
        assert_eq!(actions.association.as_deref(), Some("tard, tarde"));
        assert_eq!(service.calls_of(QueryKind::NounDetail), 0);

        let service = ScriptedCompletion::new()
            .reply(QueryKind::Classify, "rapidement", json!({"pos": "noun"}))
            .reply(QueryKind::NounDetail, "rapidement", json!({"translation": "rápidamente", "article": "le"}))
            .reply(QueryKind::PhraseTranscription, "rapidement", json!({"ipa": "/ʁapidmɑ̃/"}));
        let actions = prepare(&service, &WordRequest::new("rapidement", 1, "fr"));
        assert_eq!(actions.pos, Some(PosTag::Other));
        assert_eq!(actions.association.as_deref(), Some("rapidement, rápidamente"));
    }

    #[test]
    fn test_noun_verb_stores_noun_and_paradigm() {
        let service = ScriptedCompletion::new()
            .reply(QueryKind::Classify, "été", json!({"pos": "verb"}))
            .reply(QueryKind::NounDetail, "été", json!({"translation": "verano", "article": "l'", "base_article": "le"}))
            .reply(QueryKind::NounTranscription, "l'été", json!({"ipa": "/l‿ete/"}))
            .reply(
                QueryKind::VerbDetail,
                "été",
                json!({"tense": "participe passé", "forms": [{"pronoun": "j'", "phrase": "j'ai été", "translation": "he sido"}]}),
            )
            .reply(QueryKind::VerbTranscription, "j'ai été", json!({"ipa": "/ʒe ete/"}))
            .reply(QueryKind::VerbTranscription, "être", json!({"ipa": "/ɛtʁ/"}));
        let actions = prepare(&service, &WordRequest::new("été", 1, "fr"));
        assert_eq!(actions.pos, Some(PosTag::NounVerb));
        assert_eq!(actions.association.as_deref(), Some("l'été (m), verano"));
        assert_eq!(inserted(&actions), vec!["été", "j'ai été", "être"]);
        assert!(actions.is_verb());
        assert_eq!(actions.primary_word(), "été");
    }

    #[test]
    fn test_rejected_words_guard_on_every_insert() {
        let service = ami_script();
        let request = WordRequest::new("ami", 1, "fr")
            .with_user("user-123")
            .with_rejected_words_table("palabras_rechazadas");
        let actions = prepare(&service, &request);
        for q in actions.queries.iter().filter(|q| q.kind == StatementKind::InsertEntry) {
            assert!(q.sql.contains("NOT EXISTS (SELECT 1 FROM palabras_rechazadas"));
            assert_eq!(q.params[4], SqlValue::Text("user-123".to_string()));
            assert_eq!(q.params[5], SqlValue::Text("fr".to_string()));
            assert_eq!(q.params[6], SqlValue::Text("ami".to_string()));
        }
    }

    #[test]
    fn test_guard_misconfiguration_fails_before_any_request() {
        let service = ScriptedCompletion::new();
        let config = PipelineConfig {
            rejected_words_table: Some("palabras_rechazadas".to_string()),
            ..PipelineConfig::default()
        };
        let result = Pipeline::new(Some(&service), &config).prepare(&WordRequest::new("ami", 1, "fr"));
        assert!(matches!(result, Err(Error::Config(_))));

        let bad = WordRequest::new("ami", 1, "fr")
            .with_user("u")
            .with_rejected_words_table("x; DROP TABLE words");
        let result = Pipeline::new(Some(&service), &PipelineConfig::default()).prepare(&bad);
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(service.calls().is_empty());
    }

    #[test]
    fn test_empty_input_is_invalid() {
        let service = ScriptedCompletion::new();
        let config = PipelineConfig::default();
        let result = Pipeline::new(Some(&service), &config).prepare(&WordRequest::new(" ¿?! ", 1, "fr"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_offline_pipeline_stores_bare_word() {
        let config = PipelineConfig::default();
        let actions = Pipeline::new(None, &config)
            .prepare(&WordRequest::new("L'ami", 4, "fr"))
            .unwrap();
        assert_eq!(actions.canonical_word, "ami");
        assert_eq!(actions.queries.len(), 1);
        assert_eq!(actions.queries[0].params[1], SqlValue::Null);
    }

    #[test]
    fn test_prepare_word_actions_without_key_is_offline() {
        let config = PipelineConfig::default();
        let actions = prepare_word_actions(&WordRequest::new("tard", 2, "fr"), &config).unwrap();
        assert_eq!(actions.canonical_word, "tard");
        assert_eq!(actions.list_id, 2);
        assert_eq!(actions.debug_info["enriched"], false);
    }

    #[test]
    fn test_service_errors_propagate() {
        let service = ScriptedCompletion::new().fail(QueryKind::Classify, "ami", 500, "server exploded");
        let config = PipelineConfig::default();
        let result = Pipeline::new(Some(&service), &config).prepare(&WordRequest::new("ami", 1, "fr"));
        assert!(matches!(result, Err(Error::Service { status: 500, .. })));
    }
}
