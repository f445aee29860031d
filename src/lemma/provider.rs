//! Lemma provider with persistent cache and manual overrides.
//!
//! Wraps a [`LemmaBackend`] adapter behind a cache and an override table.
//! Lemmatization failures never abort the pipeline: the first backend
//! error permanently latches a fallback mode that returns the normalized
//! token as its own lemma.

use crate::lemma::backend::LemmaBackend;
use crate::normalize::{contains_greek, normalize_for_match, normalize_nfc, trim_punctuation};
use crate::stopwords::StopWords;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, RwLock};

/// Sentinel backend name reported when no backend is active.
pub const FALLBACK_BACKEND: &str = "fallback";

/// Resolves lemmas for Greek tokens.
///
/// Resolution order for a token: override table, in-memory cache, live
/// backend, normalized-self fallback. Every resolved lemma for a
/// non-empty key is cached in memory; nothing touches the persistent
/// cache file until [`LemmaProvider::save_cache`] is called.
///
/// # Interior mutability
///
/// The cache sits behind an `RwLock` so the provider can be shared by
/// reference between the deck index and the detector. Lock poisoning
/// fails open: a poisoned cache means a missed hit and a recomputed
/// lemma, never a panic. Lemma resolution is deterministic, so a lost
/// cache write is invisible to callers.
pub struct LemmaProvider {
    /// Backend adapter, if one was configured.
    backend: Option<Box<dyn LemmaBackend>>,
    /// Latched once the backend fails; never cleared for the process lifetime.
    backend_down: AtomicBool,
    /// In-memory cache: normalized token → lemma. No eviction.
    cache: RwLock<HashMap<String, String>>,
    /// Manual corrections: normalized token → forced lemma. Read-only.
    overrides: HashMap<String, String>,
    /// Where `save_cache` writes, if anywhere.
    cache_path: Option<PathBuf>,
    /// Stop-word resource, loaded lazily on first `best_lemma` call.
    stopwords_path: Option<PathBuf>,
    stopwords: OnceLock<StopWords>,
}

impl LemmaProvider {
    /// Creates a provider with no backend, no cache file, and no overrides.
    ///
    /// Every token resolves to its normalized self.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: None,
            backend_down: AtomicBool::new(false),
            cache: RwLock::new(HashMap::new()),
            overrides: HashMap::new(),
            cache_path: None,
            stopwords_path: None,
            stopwords: OnceLock::new(),
        }
    }

    /// Attaches a backend adapter.
    #[must_use]
    pub fn with_backend(mut self, backend: Box<dyn LemmaBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attaches a persistent cache file, loading any existing contents.
    ///
    /// A missing or unreadable file starts with an empty cache; the cache
    /// is an optimization, not a correctness requirement.
    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(existing) = load_flat_map(&path) {
            tracing::debug!(path = %path.display(), entries = existing.len(), "loaded lemma cache");
            self.cache = RwLock::new(existing);
        }
        self.cache_path = Some(path);
        self
    }

    /// Attaches a read-only override table.
    ///
    /// A missing file yields an empty table. Invalid JSON is a
    /// configuration error: overrides exist to correct known-bad
    /// lemmatizations, so silently dropping them would be worse than
    /// failing the run.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the file exists but is not a flat
    /// JSON string map.
    pub fn with_overrides_path(mut self, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(self);
        }
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_overrides".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        self.overrides = serde_json::from_str(&contents).map_err(|e| {
            Error::InvalidInput(format!("invalid overrides JSON in {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), entries = self.overrides.len(), "loaded lemma overrides");
        Ok(self)
    }

    /// Sets the stop-word resource used by `best_lemma`.
    ///
    /// The file is read lazily on first use; a missing resource degrades
    /// to an empty set.
    #[must_use]
    pub fn with_stopwords_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stopwords_path = Some(path.into());
        self
    }

    /// Returns the lemma of the most substantive token in `text`.
    ///
    /// Tokens are tried in order; the first one that contains Greek
    /// letters and is not a stop word wins. If none qualifies, the first
    /// token overall is lemmatized, and empty input yields `""`.
    #[must_use]
    pub fn best_lemma(&self, text: &str) -> String {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return String::new();
        }

        for raw in &tokens {
            let token = trim_punctuation(raw);
            if !contains_greek(token) {
                continue;
            }
            let key = normalize_for_match(token);
            if self.stopwords().is_stop_word(&key) {
                continue;
            }
            return self.lemmatize_token(token);
        }

        // No substantive Greek token; fall back to the first token.
        self.lemmatize_token(trim_punctuation(tokens[0]))
    }

    /// Returns the lemma of a single token, normalized for matching.
    #[must_use]
    pub fn lemmatize_token(&self, token: &str) -> String {
        if token.is_empty() {
            return String::new();
        }
        let key = normalize_for_match(token);
        if key.is_empty() {
            return String::new();
        }

        if let Some(forced) = self.overrides.get(&key) {
            let lemma = normalize_for_match(forced);
            self.cache_insert(&key, &lemma);
            return lemma;
        }

        if let Some(hit) = self.cache_get(&key) {
            return hit;
        }

        let lemma = self.resolve_via_backend(token, &key);
        self.cache_insert(&key, &lemma);
        lemma
    }

    /// Writes the in-memory cache to its configured location.
    ///
    /// No-op without a configured path. Write failures are logged and
    /// swallowed: persistence is best-effort.
    pub fn save_cache(&self) {
        let Some(path) = &self.cache_path else {
            return;
        };
        let Ok(cache) = self.cache.read() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&*cache) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to write lemma cache");
                } else {
                    tracing::debug!(path = %path.display(), entries = cache.len(), "saved lemma cache");
                }
            },
            Err(e) => tracing::warn!(error = %e, "failed to serialize lemma cache"),
        }
    }

    /// Reports which lemmatization capability is active.
    ///
    /// Returns the backend's identifier, or [`FALLBACK_BACKEND`] when no
    /// backend is configured or the backend has been marked unavailable.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Some(backend) if !self.backend_down.load(Ordering::Relaxed) => backend.name(),
            _ => FALLBACK_BACKEND,
        }
    }

    /// Number of entries currently cached.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    fn stopwords(&self) -> &StopWords {
        self.stopwords.get_or_init(|| {
            self.stopwords_path
                .as_deref()
                .map_or_else(StopWords::empty, StopWords::load)
        })
    }

    fn resolve_via_backend(&self, token: &str, key: &str) -> String {
        let Some(backend) = self.backend.as_deref() else {
            return key.to_string();
        };
        if self.backend_down.load(Ordering::Relaxed) {
            return key.to_string();
        }

        match backend.lemmatize(&normalize_nfc(token)) {
            Ok(Some(lemma)) => {
                let normalized = normalize_for_match(&lemma);
                if normalized.is_empty() {
                    key.to_string()
                } else {
                    normalized
                }
            },
            Ok(None) => key.to_string(),
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    error = %e,
                    "lemmatization backend failed, falling back for the rest of the run"
                );
                self.backend_down.store(true, Ordering::Relaxed);
                key.to_string()
            },
        }
    }

    fn cache_get(&self, key: &str) -> Option<String> {
        self.cache.read().ok()?.get(key).cloned()
    }

    fn cache_insert(&self, key: &str, lemma: &str) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key.to_string(), lemma.to_string());
        }
    }
}

impl Default for LemmaProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a flat JSON string map, returning `None` on any failure.
fn load_flat_map(path: &Path) -> Option<HashMap<String, String>> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(map) => Some(map),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable lemma cache");
            None
        },
    }
}
