use serde::{Deserialize, Serialize};

use crate::store::statement::Statement;

/// Part-of-speech tag assigned by the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    NounVerb,
    Other,
    /// Nothing usable came back; never survives finalization.
    Unknown,
}

impl PosTag {
    pub fn is_noun(self) -> bool {
        matches!(self, PosTag::Noun | PosTag::NounVerb)
    }

    pub fn is_verb(self) -> bool {
        matches!(self, PosTag::Verb | PosTag::NounVerb)
    }

    /// Terminal tag used for branch selection.
    pub fn finalized(self) -> PosTag {
        match self {
            PosTag::Unknown => PosTag::Other,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PosTag::Noun => "noun",
            PosTag::Verb => "verb",
            PosTag::Adjective => "adjective",
            PosTag::NounVerb => "noun_verb",
            PosTag::Other => "other",
            PosTag::Unknown => "unknown",
        }
    }
}

/// Grammatical gender of a noun.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[serde(rename = "m")]
    Masculine,
    #[serde(rename = "f")]
    Feminine,
    #[serde(rename = "n")]
    Neuter,
}

impl Gender {
    /// Short marker used in stored phrases, e.g. `l'ami (m)`.
    pub fn marker(self) -> &'static str {
        match self {
            Gender::Masculine => "m",
            Gender::Feminine => "f",
            Gender::Neuter => "n",
        }
    }
}

/// Classifier verdict for one token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub tag: PosTag,
    pub lemma: Option<String>,
}

impl Classification {
    pub fn new(tag: PosTag) -> Self {
        Self { tag, lemma: None }
    }

    pub fn is_noun(&self) -> bool {
        self.tag.is_noun()
    }

    pub fn is_verb(&self) -> bool {
        self.tag.is_verb()
    }

    pub fn is_adjective(&self) -> bool {
        self.tag == PosTag::Adjective
    }
}

/// Article, gender and translation of a noun.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NounDetail {
    pub translation: Option<String>,
    /// Canonical article without trailing space: `le`, `la`, `les`, `l'`, `der`...
    pub article: Option<String>,
    pub base_article: Option<String>,
    pub gender: Option<Gender>,
}

/// Translation and feminine form of an adjective.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdjectiveDetail {
    pub translation: Option<String>,
    pub feminine: Option<String>,
    pub feminine_translation: Option<String>,
}

/// One pronoun slot of a verb paradigm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerbParadigmEntry {
    pub pronoun: String,
    pub phrase: String,
    pub translation: Option<String>,
    pub transcription: Option<String>,
}

impl VerbParadigmEntry {
    pub fn new(pronoun: &str, phrase: &str, translation: Option<String>) -> Self {
        Self {
            pronoun: pronoun.to_string(),
            phrase: phrase.to_string(),
            translation,
            transcription: None,
        }
    }

    /// Stored association, `"<phrase>, <translation>"`.
    pub fn association(&self) -> Option<String> {
        self.translation
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("{}, {}", self.phrase, t))
    }
}

/// Tense label and paradigm of a verb.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VerbDetail {
    pub tense: Option<String>,
    pub lemma: Option<String>,
    pub entries: Vec<VerbParadigmEntry>,
}

/// A standalone row planned next to the main entry (e.g. an irregular feminine).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryPlan {
    pub word: String,
    pub association: Option<String>,
    pub transcription: Option<String>,
}

/// One call of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct WordRequest {
    pub word: String,
    pub list_id: i64,
    pub language: String,
    /// Overrides `PipelineConfig::api_key` for this call.
    pub api_key: Option<String>,
    pub user_id: Option<String>,
    /// Overrides `PipelineConfig::rejected_words_table` for this call.
    pub rejected_words_table: Option<String>,
    pub expand_verbs: bool,
}

impl WordRequest {
    pub fn new(word: &str, list_id: i64, language: &str) -> Self {
        Self {
            word: word.to_string(),
            list_id,
            language: language.to_string(),
            api_key: None,
            user_id: None,
            rejected_words_table: None,
            expand_verbs: true,
        }
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_rejected_words_table(mut self, table: &str) -> Self {
        self.rejected_words_table = Some(table.to_string());
        self
    }

    pub fn with_expand_verbs(mut self, expand: bool) -> Self {
        self.expand_verbs = expand;
        self
    }
}

/// Everything one invocation resolved, plus the statements to persist it.
#[derive(Debug, Clone, Serialize)]
pub struct ActionSet {
    pub canonical_word: String,
    pub list_id: i64,
    /// `None` for whole-phrase inputs.
    pub pos: Option<PosTag>,
    pub is_phrase: bool,
    pub association: Option<String>,
    pub transcription: Option<String>,
    pub lemma: Option<String>,
    pub tense: Option<String>,
    pub entries: Vec<VerbParadigmEntry>,
    pub tokens: Vec<String>,
    /// Ordered, replayable: insert before update, transcription before association.
    pub queries: Vec<Statement>,
    pub debug_info: serde_json::Value,
}

impl ActionSet {
    pub fn is_verb(&self) -> bool {
        self.pos.map(PosTag::is_verb).unwrap_or(false)
    }

    /// The word whose row carries the top-level association.
    ///
    /// For pure verbs that is the first paradigm phrase, since the bare
    /// token itself is not stored.
    pub fn primary_word(&self) -> &str {
        if self.pos == Some(PosTag::Verb) {
            if let Some(first) = self.entries.first() {
                return &first.phrase;
            }
        }
        &self.canonical_word
    }
}

/// Build metadata attached to every `add_word` result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provenance {
    pub package: String,
    pub version: String,
    pub model: String,
}

impl Provenance {
    pub fn current(model: &str) -> Self {
        Self {
            package: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model: model.to_string(),
        }
    }
}

/// Result of `add_word`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddWordOutcome {
    pub entry_id: Option<i64>,
    pub association: Option<String>,
    pub transcription: Option<String>,
    pub is_verb: bool,
    pub provenance: Provenance,
}
