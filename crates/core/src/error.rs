//! Error type shared by every stage of the enrichment pipeline.

use thiserror::Error;

/// Errors surfaced by `lexifill-core`.
///
/// Malformed model output is never an error: it degrades to absent fields
/// inside the resolvers. What reaches the caller is configuration trouble,
/// unrecoverable service failures, and persistence failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Fatal configuration problem detected before any work is done.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input that normalizes to nothing usable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Completion service answered with an error the retry policy cannot absorb.
    #[error("completion service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[cfg(feature = "openai")]
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A compiled statement whose placeholders and parameters disagree.
    #[error("statement template error: {0}")]
    Template(String),

    /// Reported by a `Cursor` implementation; the caller owns the rollback.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
