//! Model-driven enrichment of a word or phrase.
//!
//! The stages run in dependency order for every token: classification,
//! per-tag detail resolution, then transcription. Multi-token input goes
//! through the phrase decomposer, which drives the same stages per token.

pub mod classify;
pub mod detail;
pub mod phonetic;
pub mod phrase;
pub mod pipeline;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::completion::CompletionService;
use crate::config::PipelineConfig;
use crate::language::LanguageRules;

pub use pipeline::{prepare_word_actions, Pipeline};

/// Structured record of every decision taken for one input.
#[derive(Debug, Default)]
pub struct DebugTrail(Map<String, Value>);

impl DebugTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<T: Serialize>(&mut self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.0.insert(key.to_string(), v);
            }
            Err(e) => log::warn!("Unrecordable debug value for {}: {}", key, e),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Shared state for the resolvers working on one token.
pub struct ResolveContext<'a> {
    pub service: &'a dyn CompletionService,
    pub rules: &'static LanguageRules,
    /// Lowercased language tag of the request.
    pub language: &'a str,
    pub config: &'a PipelineConfig,
    pub trail: DebugTrail,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        service: &'a dyn CompletionService,
        rules: &'static LanguageRules,
        language: &'a str,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            service,
            rules,
            language,
            config,
            trail: DebugTrail::new(),
        }
    }
}
