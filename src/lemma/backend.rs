//! Lemmatization backend adapters.
//!
//! The external NLP capability is modeled as a single narrow trait with
//! adapter implementations selected at construction time. There is no
//! runtime capability probing: the caller decides which adapter to build
//! from configuration, and the provider handles failures uniformly.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// A lemmatization capability: one token in, one lemma out.
///
/// `Ok(Some(lemma))` is a successful resolution. `Ok(None)` means the
/// backend is healthy but has no lemma for this token (the caller falls
/// back per-token). `Err` means the backend itself failed (transport
/// error, bad response) and the caller may stop using it.
pub trait LemmaBackend: Send + Sync {
    /// Lemmatizes a single token.
    fn lemmatize(&self, token: &str) -> Result<Option<String>>;

    /// Human-readable identifier of the capability, for diagnostics.
    fn name(&self) -> &'static str;
}

/// Backend backed by a local JSON lexicon file.
///
/// The file is a flat JSON object mapping normalized token → lemma, the
/// same shape as the lemma cache and overrides files. Useful for offline
/// runs against a pre-exported dictionary.
#[derive(Debug)]
pub struct LexiconBackend {
    entries: HashMap<String, String>,
}

impl LexiconBackend {
    /// Loads a lexicon from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::OperationFailed` if the file cannot be read and
    /// `Error::InvalidInput` if it is not a flat JSON string map.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_lexicon".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let entries: HashMap<String, String> = serde_json::from_str(&contents)
            .map_err(|e| Error::InvalidInput(format!("invalid lexicon JSON in {}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), entries = entries.len(), "loaded lexicon backend");
        Ok(Self { entries })
    }

    /// Builds a lexicon from in-memory entries. Primarily for tests.
    #[must_use]
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl LemmaBackend for LexiconBackend {
    fn lemmatize(&self, token: &str) -> Result<Option<String>> {
        Ok(self.entries.get(token).cloned())
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

/// Request body for the HTTP lemmatization service.
#[derive(Serialize)]
struct LemmaRequest<'a> {
    token: &'a str,
}

/// Response body from the HTTP lemmatization service.
#[derive(Deserialize)]
struct LemmaResponse {
    lemma: String,
}

/// Backend that POSTs tokens to an external lemmatization service.
///
/// The wire contract is `POST {"token": ...}` → `{"lemma": ...}`. Every
/// request carries a bounded timeout; any transport, status, or decode
/// failure is reported as a backend error so the provider can latch the
/// fallback path instead of blocking per token.
pub struct HttpLemmaBackend {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpLemmaBackend {
    /// Creates a backend for the given service URL.
    ///
    /// # Errors
    ///
    /// Returns `Error::OperationFailed` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::OperationFailed {
                operation: "build_http_backend".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl LemmaBackend for HttpLemmaBackend {
    fn lemmatize(&self, token: &str) -> Result<Option<String>> {
        let response = self
            .client
            .post(&self.url)
            .json(&LemmaRequest { token })
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| Error::OperationFailed {
                operation: "lemmatize_request".to_string(),
                cause: e.to_string(),
            })?;

        let body: LemmaResponse = response.json().map_err(|e| Error::OperationFailed {
            operation: "decode_lemma_response".to_string(),
            cause: e.to_string(),
        })?;

        if body.lemma.is_empty() {
            Ok(None)
        } else {
            Ok(Some(body.lemma))
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
