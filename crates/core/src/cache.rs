//! File-based cache for completion replies.
//!
//! Requests run at temperature zero, so replaying a stored reply is
//! equivalent to asking again. Keys are SHA-256 hashes of the model name
//! and the serialized request.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::completion::{ChatMessage, CompletionRequest, CompletionService};
use crate::error::Result;

/// Default cache directory.
///
/// Uses `LEXIFILL_CACHE_DIR` if set, otherwise `~/.cache/lexifill`.
pub fn default_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LEXIFILL_CACHE_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".cache").join("lexifill")
}

#[derive(Serialize)]
struct CacheKey<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    json_mode: bool,
}

/// Hex SHA-256 of everything that influences a reply.
pub fn request_hash(model: &str, request: &CompletionRequest) -> Result<String> {
    let key = CacheKey {
        model,
        messages: &request.messages,
        max_tokens: request.max_tokens,
        json_mode: request.json_mode,
    };
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&key)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Atomically write data to a file via temp file + rename.
fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = target.with_extension("tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, target)?;
    Ok(())
}

/// Completion service decorator that replays stored replies.
pub struct CachedCompletion<S: CompletionService> {
    inner: S,
    dir: PathBuf,
}

impl<S: CompletionService> CachedCompletion<S> {
    pub fn new(inner: S, dir: PathBuf) -> Self {
        Self { inner, dir }
    }

    fn entry_path(&self, hash: &str) -> PathBuf {
        self.dir.join("completion").join(format!("{}.txt", hash))
    }

    /// Return the cached reply, or None if not cached.
    pub fn get_cached_reply(&self, hash: &str) -> Option<String> {
        let path = self.entry_path(hash);
        let content = std::fs::read_to_string(&path).ok()?;
        if content.is_empty() {
            return None;
        }
        log::info!("Cache hit: completion ({}...)", &hash[..12.min(hash.len())]);
        Some(content)
    }

    /// Store a reply in the cache.
    pub fn store_reply_cache(&self, hash: &str, content: &str) -> Result<()> {
        atomic_write(&self.entry_path(hash), content.as_bytes())?;
        log::debug!("Cached completion ({}...)", &hash[..12.min(hash.len())]);
        Ok(())
    }
}

impl<S: CompletionService> CompletionService for CachedCompletion<S> {
    fn model(&self) -> &str {
        self.inner.model()
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let hash = request_hash(self.inner.model(), request)?;
        if let Some(content) = self.get_cached_reply(&hash) {
            return Ok(content);
        }
        let content = self.inner.complete(request)?;
        if !content.is_empty() {
            if let Err(e) = self.store_reply_cache(&hash, &content) {
                log::warn!("Failed to cache completion: {}", e);
            }
        }
        Ok(content)
    }
}
