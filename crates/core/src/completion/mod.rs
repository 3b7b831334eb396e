//! Completion-service interface.
//!
//! Every linguistic decision the pipeline cannot make locally is delegated
//! to a chat-completion backend through [`CompletionService`]. Replies are
//! parsed leniently: anything that is not a JSON object yields `None`.

pub mod prompts;

#[cfg(feature = "openai")]
pub mod openai;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// What a request is asking for. Local metadata, never sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Classify,
    VerbCheck,
    NounDetail,
    ArticleRetry,
    AdjectiveDetail,
    OtherDetail,
    VerbDetail,
    NounTranscription,
    VerbTranscription,
    PhraseTranscription,
    PhraseTranslation,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Classify => "classify",
            QueryKind::VerbCheck => "verb_check",
            QueryKind::NounDetail => "noun_detail",
            QueryKind::ArticleRetry => "article_retry",
            QueryKind::AdjectiveDetail => "adjective_detail",
            QueryKind::OtherDetail => "other_detail",
            QueryKind::VerbDetail => "verb_detail",
            QueryKind::NounTranscription => "noun_transcription",
            QueryKind::VerbTranscription => "verb_transcription",
            QueryKind::PhraseTranscription => "phrase_transcription",
            QueryKind::PhraseTranslation => "phrase_translation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// One completion round trip. Temperature is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub kind: QueryKind,
    /// Word or phrase the request is about.
    pub subject: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    /// Ask the backend for a strict JSON object.
    pub json_mode: bool,
}

/// Chat-completion backend.
pub trait CompletionService: Send + Sync {
    /// Model name, for logging and provenance.
    fn model(&self) -> &str;

    /// Send the request and return the raw reply content.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Parse the JSON object embedded in a reply.
///
/// Models sometimes wrap the object in prose or code fences, so the slice
/// between the first `{` and the last `}` is parsed.
pub fn extract_json_object(content: &str) -> Option<Map<String, Value>> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&content[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Send a request and parse the reply as a JSON object.
///
/// Service errors propagate; an unparsable reply is `Ok(None)`.
pub fn query_json(
    service: &dyn CompletionService,
    request: &CompletionRequest,
) -> Result<Option<Map<String, Value>>> {
    log::debug!("completion {} for {:?}", request.kind.as_str(), request.subject);
    let content = service.complete(request)?;
    let parsed = extract_json_object(&content);
    if parsed.is_none() {
        log::warn!(
            "{} reply for {:?} is not a JSON object",
            request.kind.as_str(),
            request.subject
        );
    }
    Ok(parsed)
}

/// First non-empty string found under any of `keys`.
pub fn field_str(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// First present, non-null value under any of `keys`.
pub fn field_value<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|v| !v.is_null())
}
