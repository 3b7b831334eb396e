//! Vocabulary enrichment for French and German word lists.
//!
//! A word or phrase is classified, glossed into Spanish and transcribed by
//! a chat-completion model, then compiled into idempotent SQL statements
//! for the `words` table.

pub mod audit;
pub mod cache;
pub mod completion;
pub mod config;
pub mod enrich;
pub mod error;
pub mod language;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use completion::{CompletionRequest, CompletionService, QueryKind};
pub use config::PipelineConfig;
pub use enrich::{prepare_word_actions, Pipeline};
pub use error::{Error, Result};
pub use store::{add_word, Cursor, SqlValue, Statement, StatementKind};
pub use types::*;
