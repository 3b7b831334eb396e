//! Pipeline configuration.
//!
//! Everything the resolvers need to know about their environment is carried
//! in a [`PipelineConfig`] value. Only [`PipelineConfig::from_env`] touches
//! environment variables; callers are free to build the value by hand.

use std::time::Duration;

/// Default OpenAI chat completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
/// Primary model when `OPENAI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Model used when the primary one is unavailable.
pub const FALLBACK_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub fallback_model: String,
    pub endpoint: String,
    pub request_timeout: Duration,
    /// Log the full structured debug trail of every prepared action set.
    pub debug: bool,
    /// Compile homophone link statements and link live in `add_word`.
    pub link_homophones: bool,
    /// Collapse il/elle/on style pronoun slots sharing the same verb form.
    pub merge_ambiguous_pronouns: bool,
    /// Default rejected-words registry, overridable per request.
    pub rejected_words_table: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            fallback_model: FALLBACK_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
            debug: false,
            link_homophones: true,
            merge_ambiguous_pronouns: false,
            rejected_words_table: None,
        }
    }
}

impl PipelineConfig {
    /// Build a config from the process environment.
    ///
    /// Reads `OPENAI_API_KEY`, `OPENAI_MODEL`, `LEXIFILL_DEBUG`,
    /// `LEXIFILL_LINK_HOMOPHONES`, `LEXIFILL_MERGE_PRONOUNS` and
    /// `LEXIFILL_REJECTED_WORDS_TABLE`. Unset or unparsable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |key: &str, default: bool| {
            non_empty(key)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(default)
        };

        Self {
            api_key: non_empty("OPENAI_API_KEY"),
            model: non_empty("OPENAI_MODEL").unwrap_or(defaults.model),
            debug: flag("LEXIFILL_DEBUG", defaults.debug),
            link_homophones: flag("LEXIFILL_LINK_HOMOPHONES", defaults.link_homophones),
            merge_ambiguous_pronouns: flag(
                "LEXIFILL_MERGE_PRONOUNS",
                defaults.merge_ambiguous_pronouns,
            ),
            rejected_words_table: non_empty("LEXIFILL_REJECTED_WORDS_TABLE"),
            ..defaults
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
