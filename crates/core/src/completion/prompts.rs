//! Prompt construction for each query kind.
//!
//! Translations always target Spanish. Every prompt asks for a single JSON
//! object so replies can go through [`extract_json_object`](super::extract_json_object).

use super::{ChatMessage, CompletionRequest, QueryKind};
use crate::language::LanguageRules;

const SYSTEM_LINGUIST: &str =
    "You are a precise lexicographer. Answer with a single JSON object and nothing else.";

const TRANSCRIPTION_FORMAT: &str = "Write the IPA between exactly one pair of slashes, e.g. /ami/. \
No square brackets, no double slashes, no syllable dots. Mark liaison with ‿ and never put a \
space next to ‿. Keep one space between words.";

/// Known paradigm transcriptions pinned in French prompts.
const FRENCH_IPA_REFERENCE: &str = "Reference transcriptions (when the phrase matches EXACTLY, use the same IPA):
| Pronoun | ÊTRE (présent) | AVOIR (présent) | ALLER (présent) | AVOIR (passé composé) | ALLER (passé composé) |
| --- | --- | --- | --- | --- | --- |
| je | /ʒə sɥi/ | /ʒe/ | /ʒə vɛ/ | /ʒe‿y/ | /ʒə sɥi‿a.le/ |
| tu | /ty ɛ/ | /ty a/ | /ty va/ | /ty a‿y/ | /ty ɛ‿a.le/ |
| il | /il ɛ/ | /il a/ | /il va/ | /il a‿y/ | /il ɛ‿a.le/ |
| elle | /ɛl ɛ/ | /ɛl a/ | /ɛl va/ | /ɛl a‿y/ | /ɛl ɛ‿a.le/ |
| on | /ɔ̃ ɛ/ | /ɔ̃ a/ | /ɔ̃ va/ | /ɔ̃ a‿y/ | /ɔ̃ ɛ‿a.le/ |
| nous | /nu sɔm/ | /nu z‿avɔ̃/ | /nu z‿alɔ̃/ | /nu z‿avɔ̃‿y/ | /nu sɔm‿a.le/ |
| vous | /vu z‿ɛt/ | /vu z‿ave/ | /vu z‿ale/ | /vu z‿ave‿y/ | /vu z‿ɛt‿a.le/ |
| ils | /il sɔ̃/ | /il z‿ɔ̃/ | /il vɔ̃/ | /il z‿ɔ̃‿t‿y/ | /il sɔ̃‿t‿a.le/ |
| elles | /ɛl sɔ̃/ | /ɛl z‿ɔ̃/ | /ɛl vɔ̃/ | /ɛl z‿ɔ̃‿t‿y/ | /ɛl sɔ̃‿t‿a.le/ |";

/// Format rules plus, for French, the reference table.
fn transcription_rules(rules: &LanguageRules) -> String {
    if rules.code == "fr" {
        format!("{TRANSCRIPTION_FORMAT}\n{FRENCH_IPA_REFERENCE}")
    } else {
        TRANSCRIPTION_FORMAT.to_string()
    }
}

fn build(
    kind: QueryKind,
    subject: &str,
    prompt: String,
    max_tokens: u32,
) -> CompletionRequest {
    CompletionRequest {
        kind,
        subject: subject.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_LINGUIST), ChatMessage::user(prompt)],
        max_tokens,
        json_mode: true,
    }
}

fn article_list(rules: &LanguageRules) -> String {
    rules
        .article_set()
        .iter()
        .map(|a| format!("\"{}\"", a))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn classify(rules: &LanguageRules, tag: &str, word: &str) -> CompletionRequest {
    let lang = rules.display_name(tag);
    build(
        QueryKind::Classify,
        word,
        format!(
            "Classify the {lang} word \"{word}\".\n\
             Return {{\"pos\": one of \"noun\", \"verb\", \"adjective\", \"noun_verb\", \"other\", \
             \"lemma\": the dictionary form or \"\"}}.\n\
             Use \"adjective\" for participles used as adjectives. Use \"noun_verb\" only when the \
             exact form is commonly both a noun and a conjugated verb."
        ),
        80,
    )
}

pub fn verb_check(rules: &LanguageRules, tag: &str, word: &str) -> CompletionRequest {
    let lang = rules.display_name(tag);
    build(
        QueryKind::VerbCheck,
        word,
        format!(
            "Is the {lang} word \"{word}\" a conjugated verb form?\n\
             Return {{\"is_verb\": true or false, \"lemma\": the infinitive or \"\"}}."
        ),
        80,
    )
}

pub fn noun_detail(rules: &LanguageRules, tag: &str, word: &str) -> CompletionRequest {
    let lang = rules.display_name(tag);
    let articles = if rules.has_closed_articles() {
        format!("one of {}", article_list(rules))
    } else {
        "the definite article".to_string()
    };
    build(
        QueryKind::NounDetail,
        word,
        format!(
            "For the {lang} noun \"{word}\" return {{\"translation\": the Spanish translation without \
             article, \"article\": {articles} as written before this word, \"base_article\": the \
             article before elision, \"gender\": \"m\" or \"f\"}}."
        ),
        120,
    )
}

pub fn article_retry(rules: &LanguageRules, tag: &str, word: &str) -> CompletionRequest {
    let lang = rules.display_name(tag);
    build(
        QueryKind::ArticleRetry,
        word,
        format!(
            "Give only the definite article of the {lang} noun \"{word}\". Allowed values: {}.\n\
             Return {{\"article\": ..., \"base_article\": ..., \"gender\": \"m\" or \"f\"}}.",
            article_list(rules)
        ),
        60,
    )
}

pub fn adjective_detail(rules: &LanguageRules, tag: &str, word: &str) -> CompletionRequest {
    let lang = rules.display_name(tag);
    build(
        QueryKind::AdjectiveDetail,
        word,
        format!(
            "For the {lang} adjective \"{word}\" return {{\"translation\": the masculine Spanish \
             translation, \"feminine\": the {lang} feminine singular form, \
             \"feminine_translation\": the Spanish feminine translation if it differs, else \"\"}}."
        ),
        140,
    )
}

pub fn other_detail(rules: &LanguageRules, tag: &str, word: &str) -> CompletionRequest {
    let lang = rules.display_name(tag);
    build(
        QueryKind::OtherDetail,
        word,
        format!("Translate the {lang} word \"{word}\" to Spanish. Return {{\"translation\": ...}}."),
        80,
    )
}

pub fn verb_detail(
    rules: &LanguageRules,
    tag: &str,
    word: &str,
    lemma: Option<&str>,
) -> CompletionRequest {
    let lang = rules.display_name(tag);
    let hint = lemma
        .map(|l| format!(" (infinitive: \"{}\")", l))
        .unwrap_or_default();
    build(
        QueryKind::VerbDetail,
        word,
        format!(
            "The {lang} word \"{word}\"{hint} is a conjugated verb. Identify its tense and give the \
             full paradigm of that tense.\n\
             Return {{\"tense\": ..., \"infinitive_translation\": the Spanish infinitive, \
             \"forms\": [{{\"pronoun\": ..., \"phrase\": pronoun + form as written, \
             \"translation\": the Spanish equivalent with its pronoun}}]}}.\n\
             List every person separately, including il, elle, on, ils and elles."
        ),
        420,
    )
}

pub fn noun_transcription(
    rules: &LanguageRules,
    tag: &str,
    phrase: &str,
) -> CompletionRequest {
    let lang = rules.display_name(tag);
    let format = transcription_rules(rules);
    build(
        QueryKind::NounTranscription,
        phrase,
        format!(
            "Give the IPA of the {lang} phrase \"{phrase}\". If the article should elide, return the \
             corrected phrase too.\n{format}\n\
             Return {{\"phrase\": ..., \"ipa\": ...}}."
        ),
        120,
    )
}

pub fn verb_transcription(
    rules: &LanguageRules,
    tag: &str,
    phrase: &str,
) -> CompletionRequest {
    let lang = rules.display_name(tag);
    let format = transcription_rules(rules);
    build(
        QueryKind::VerbTranscription,
        phrase,
        format!(
            "Give the IPA of the {lang} verb phrase \"{phrase}\". If the pronoun should elide, return \
             the corrected phrase too.\n{format}\n\
             Return {{\"phrase\": ..., \"ipa\": ...}}."
        ),
        120,
    )
}

pub fn phrase_transcription(
    rules: &LanguageRules,
    tag: &str,
    phrase: &str,
) -> CompletionRequest {
    let lang = rules.display_name(tag);
    let format = transcription_rules(rules);
    build(
        QueryKind::PhraseTranscription,
        phrase,
        format!(
            "Give the IPA of the {lang} text \"{phrase}\" exactly as written.\n{format}\n\
             Return {{\"ipa\": ...}}."
        ),
        220,
    )
}

pub fn phrase_translation(
    rules: &LanguageRules,
    tag: &str,
    phrase: &str,
) -> CompletionRequest {
    let lang = rules.display_name(tag);
    build(
        QueryKind::PhraseTranslation,
        phrase,
        format!(
            "Translate the {lang} phrase \"{phrase}\" to natural Spanish. \
             Return {{\"translation\": ...}}."
        ),
        180,
    )
}
