//! Greek stop-word list.
//!
//! Loaded from a plain-text resource (one word per line, `#` comments
//! ignored). Consumers are expected to normalize tokens before lookup;
//! the list itself is stored in normalized form at load time.

use crate::normalize::normalize_for_match;
use std::collections::HashSet;
use std::path::Path;

/// A set of Greek stop words (articles, particles, conjunctions).
///
/// A missing resource degrades to an empty set rather than failing:
/// stop-word awareness improves lemma selection but is never required
/// for the pipeline to run.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Creates an empty stop-word set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads stop words from a word-list file.
    ///
    /// Each line holds one word; blank lines and `#`-prefixed comments are
    /// skipped. Entries are normalized on load so lookups against
    /// normalized tokens succeed regardless of the list's accenting.
    ///
    /// A missing or unreadable file returns an empty set.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            tracing::warn!(path = %path.display(), "stop-word list not found, using empty set");
            return Self::empty();
        };

        let words: HashSet<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(normalize_for_match)
            .filter(|w| !w.is_empty())
            .collect();

        tracing::debug!(path = %path.display(), count = words.len(), "loaded stop words");
        Self { words }
    }

    /// Builds a set from an iterator of words, normalizing each entry.
    ///
    /// Primarily for tests and embedded defaults.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| normalize_for_match(w.as_ref()))
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Returns true if the normalized token is a stop word.
    #[must_use]
    pub fn is_stop_word(&self, normalized_token: &str) -> bool {
        self.words.contains(normalized_token)
    }

    /// Number of entries in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let words = StopWords::load(Path::new("/nonexistent/stopwords.txt"));
        assert!(words.is_empty());
        assert!(!words.is_stop_word("και"));
    }

    #[test]
    fn test_load_skips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# articles").unwrap();
        writeln!(file, "ὁ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "καί").unwrap();
        file.flush().unwrap();

        let words = StopWords::load(file.path());
        assert_eq!(words.len(), 2);
        assert!(words.is_stop_word("ο"));
        assert!(words.is_stop_word("και"));
        assert!(!words.is_stop_word("# articles"));
    }

    #[test]
    fn test_entries_normalized_on_load() {
        let words = StopWords::from_words(["Καί", "τῆς"]);
        assert!(words.is_stop_word("και"));
        assert!(words.is_stop_word("τησ"));
        assert!(!words.is_stop_word("καί"));
    }
}
