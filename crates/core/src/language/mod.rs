//! Source-language text handling: rule tables, normalization, tokenization.

pub mod normalize;
pub mod rules;
pub mod tokenize;

pub use normalize::{normalize_user_text, storage_safe};
pub use rules::{rules_for, LanguageRules};
pub use tokenize::{split_tokens, tokenize};
