//! Reference deck index.
//!
//! Three lookup tables built once from the reference corpus: exact
//! normalized Greek, lemma, and English gloss, each mapping a key to the
//! set of note ids carrying it.

use crate::lemma::LemmaProvider;
use crate::normalize::normalize_for_match;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Opaque identifier of a reference-deck note.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(String);

impl NoteId {
    /// Creates a new note ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One reference-deck card, immutable once parsed.
#[derive(Debug, Clone)]
pub struct NoteEntry {
    /// Identifier from the export (GUID column).
    pub note_id: NoteId,
    /// Source template (model) name.
    pub model: String,
    /// Raw target-language field text.
    pub greek_text: String,
    /// Raw gloss field text.
    pub english_text: String,
}

impl NoteEntry {
    /// Creates a note entry.
    #[must_use]
    pub fn new(
        note_id: impl Into<NoteId>,
        model: impl Into<String>,
        greek_text: impl Into<String>,
        english_text: impl Into<String>,
    ) -> Self {
        Self {
            note_id: note_id.into(),
            model: model.into(),
            greek_text: greek_text.into(),
            english_text: english_text.into(),
        }
    }
}

/// Normalizes a gloss for index lookup.
///
/// Gloss matching is case- and edge-whitespace-insensitive only; accents
/// and punctuation are kept so "loose!" and "loose" stay distinct.
#[must_use]
pub fn gloss_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Lookup tables over the reference deck.
///
/// Built once per run; append-only during construction. A note may
/// contribute to zero, one, two, or three mappings (a key is only added
/// when non-empty) but always appears exactly once in the note list.
#[derive(Debug, Default)]
pub struct DeckIndex {
    exact_greek: HashMap<String, BTreeSet<NoteId>>,
    lemma_index: HashMap<String, BTreeSet<NoteId>>,
    gloss_index: HashMap<String, BTreeSet<NoteId>>,
    notes: Vec<NoteEntry>,
}

impl DeckIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a note to the index.
    ///
    /// The exact-Greek key comes from the normalized target field, the
    /// lemma key from `best_lemma` (only when a provider is supplied and
    /// the target text is non-empty), and the gloss key from the trimmed,
    /// lowercased gloss field. The note itself is recorded
    /// unconditionally.
    pub fn add_note(&mut self, note: NoteEntry, lemmas: Option<&LemmaProvider>) {
        let greek_key = normalize_for_match(&note.greek_text);
        if !greek_key.is_empty() {
            self.exact_greek
                .entry(greek_key)
                .or_default()
                .insert(note.note_id.clone());
        }

        if let Some(provider) = lemmas {
            if !note.greek_text.is_empty() {
                let lemma_key = normalize_for_match(&provider.best_lemma(&note.greek_text));
                if !lemma_key.is_empty() {
                    self.lemma_index
                        .entry(lemma_key)
                        .or_default()
                        .insert(note.note_id.clone());
                }
            }
        }

        let english_key = gloss_key(&note.english_text);
        if !english_key.is_empty() {
            self.gloss_index
                .entry(english_key)
                .or_default()
                .insert(note.note_id.clone());
        }

        self.notes.push(note);
    }

    /// Note ids whose normalized Greek equals `key`.
    #[must_use]
    pub fn exact_matches(&self, key: &str) -> Option<&BTreeSet<NoteId>> {
        self.exact_greek.get(key)
    }

    /// Note ids whose lemma equals `key`.
    #[must_use]
    pub fn lemma_matches(&self, key: &str) -> Option<&BTreeSet<NoteId>> {
        self.lemma_index.get(key)
    }

    /// Note ids whose gloss equals `key`.
    #[must_use]
    pub fn gloss_matches(&self, key: &str) -> Option<&BTreeSet<NoteId>> {
        self.gloss_index.get(key)
    }

    /// All notes, in insertion order.
    #[must_use]
    pub fn notes(&self) -> &[NoteEntry] {
        &self.notes
    }

    /// Number of notes in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns true if the index holds no notes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Number of distinct exact-Greek keys.
    #[must_use]
    pub fn exact_key_count(&self) -> usize {
        self.exact_greek.len()
    }

    /// Number of distinct lemma keys.
    #[must_use]
    pub fn lemma_key_count(&self) -> usize {
        self.lemma_index.len()
    }

    /// Number of distinct gloss keys.
    #[must_use]
    pub fn gloss_key_count(&self) -> usize {
        self.gloss_index.len()
    }
}
