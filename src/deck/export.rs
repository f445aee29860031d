//! Anki export parsing and field mapping.
//!
//! The reference corpus is a tab-delimited Anki notes export with
//! `#`-prefixed header lines. Data rows carry a GUID, a model (template)
//! name, a deck name, N content fields, and trailing tags; the
//! `#tags column:` header declares the 1-based tags column, falling back
//! to the last column when absent.

// Static patterns are guaranteed to compile, so expect() is safe here.
#![allow(clippy::expect_used)]

use crate::deck::index::{DeckIndex, NoteEntry};
use crate::lemma::LemmaProvider;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

static SOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[sound:[^\]]+\]").expect("static regex: sound reference"));
static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex: inline HTML tag"));

/// Default field positions applied when a model has no explicit entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldDefaults {
    /// 0-based content-field index of the target-language text.
    pub target_field_index: usize,
    /// 0-based content-field index of the gloss text.
    pub gloss_field_index: usize,
    /// Whether notes of this model are excluded from the index.
    pub ignore: bool,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            target_field_index: 0,
            gloss_field_index: 1,
            ignore: false,
        }
    }
}

/// Per-model override of any default field position.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldOverride {
    /// Target-language field index override.
    pub target_field_index: Option<usize>,
    /// Gloss field index override.
    pub gloss_field_index: Option<usize>,
    /// Ignore-flag override.
    pub ignore: Option<bool>,
}

/// Per-template field-mapping configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldMap {
    /// Defaults applied when a model has no entry.
    #[serde(default)]
    pub defaults: FieldDefaults,
    /// Overrides keyed by model name.
    #[serde(default)]
    pub models: HashMap<String, FieldOverride>,
}

impl FieldMap {
    /// Loads a field map from a JSON file.
    ///
    /// A missing file yields the built-in defaults; a present but
    /// unparsable file is a configuration error.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the JSON does not match the
    /// expected shape.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no field map, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_field_map".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::InvalidInput(format!("invalid field map JSON in {}: {e}", path.display()))
        })
    }

    /// Resolves the effective field positions for a model.
    #[must_use]
    pub fn resolve(&self, model: &str) -> FieldDefaults {
        let Some(entry) = self.models.get(model) else {
            return self.defaults.clone();
        };
        FieldDefaults {
            target_field_index: entry
                .target_field_index
                .unwrap_or(self.defaults.target_field_index),
            gloss_field_index: entry
                .gloss_field_index
                .unwrap_or(self.defaults.gloss_field_index),
            ignore: entry.ignore.unwrap_or(self.defaults.ignore),
        }
    }
}

/// Strips Anki markup from a content field.
///
/// `[sound:...]` references and inline HTML tags become spaces, HTML
/// entities are decoded, and whitespace is collapsed. Normalization for
/// matching happens later; this only removes markup.
#[must_use]
pub fn clean_field_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let t = SOUND_RE.replace_all(text, " ");
    let t = HTML_TAG_RE.replace_all(&t, " ");
    let t = html_escape::decode_html_entities(&t);
    t.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds a deck index from an export file.
///
/// A missing export degrades to an empty index: "no deck yet" is a
/// valid starting state, not an error.
#[must_use]
pub fn build_from_export(
    path: &Path,
    field_map: &FieldMap,
    lemmas: Option<&LemmaProvider>,
) -> DeckIndex {
    let Ok(contents) = std::fs::read_to_string(path) else {
        tracing::info!(path = %path.display(), "reference export not found, starting with empty deck");
        return DeckIndex::new();
    };
    let index = index_export(&contents, field_map, lemmas);
    tracing::debug!(
        path = %path.display(),
        notes = index.len(),
        exact_keys = index.exact_key_count(),
        lemma_keys = index.lemma_key_count(),
        gloss_keys = index.gloss_key_count(),
        "built deck index"
    );
    index
}

/// Builds a deck index from export contents.
#[must_use]
pub fn index_export(
    contents: &str,
    field_map: &FieldMap,
    lemmas: Option<&LemmaProvider>,
) -> DeckIndex {
    let mut index = DeckIndex::new();
    let mut tags_column: Option<usize> = None;

    for line in contents.lines() {
        if let Some(header) = line.strip_prefix('#') {
            let header = header.to_lowercase();
            if let Some(value) = header.strip_prefix("tags column:") {
                tags_column = value.trim().parse::<usize>().ok();
            }
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 4 {
            continue;
        }

        let guid = parts[0].trim().trim_matches('"');
        let model = parts[1].trim();
        // parts[2] is the deck name; positional only.

        let resolved = field_map.resolve(model);
        if resolved.ignore {
            continue;
        }

        // Content fields run from column 3 up to the tags column.
        let tags_start = match tags_column {
            Some(col) if col > 0 && col <= parts.len() => col - 1,
            _ => parts.len() - 1,
        };
        let fields = parts.get(3..tags_start).unwrap_or(&[]);

        let greek_text = fields
            .get(resolved.target_field_index)
            .copied()
            .map_or_else(String::new, clean_field_text);
        let english_text = fields
            .get(resolved.gloss_field_index)
            .copied()
            .map_or_else(String::new, clean_field_text);

        index.add_note(
            NoteEntry::new(guid, model, greek_text, english_text),
            lemmas,
        );
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
#separator:tab\n\
#guid column:1\n\
#notetype column:2\n\
#deck column:3\n\
#tags column:6\n\
abc123\tBasic\tUnified Greek\tλύω\tI loose\tverb\n\
def456\tBasic\tUnified Greek\tκαί\tand\tparticle\n\
ghi789\tListening\tUnified Greek\t[sound:kai.mp3] <b>λέγω</b>\tI say&nbsp;aloud\t\n";

    #[test]
    fn test_parse_basic_export() {
        let index = index_export(EXPORT, &FieldMap::default(), None);
        assert_eq!(index.len(), 3);
        assert!(index.exact_matches("λυω").is_some());
        assert!(index.gloss_matches("and").is_some());
    }

    #[test]
    fn test_markup_stripped_and_entities_decoded() {
        let index = index_export(EXPORT, &FieldMap::default(), None);
        let note = &index.notes()[2];
        assert_eq!(note.greek_text, "λέγω");
        assert_eq!(note.english_text, "I say aloud");
    }

    #[test]
    fn test_tags_column_header_bounds_fields() {
        // Without the tags header the last column would be treated as
        // tags; with it, field extraction stops at column 6.
        let index = index_export(EXPORT, &FieldMap::default(), None);
        let note = &index.notes()[0];
        assert_eq!(note.english_text, "I loose");
    }

    #[test]
    fn test_missing_tags_header_uses_last_column() {
        let export = "id1\tBasic\tDeck\tλύω\tI loose\ttag1 tag2\n";
        let index = index_export(export, &FieldMap::default(), None);
        assert_eq!(index.notes()[0].english_text, "I loose");
    }

    #[test]
    fn test_ignored_model_skipped() {
        let map: FieldMap = serde_json::from_str(
            r#"{"defaults": {"target_field_index": 0, "gloss_field_index": 1, "ignore": false},
                "models": {"Listening": {"ignore": true}}}"#,
        )
        .unwrap();
        let index = index_export(EXPORT, &map, None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_model_field_override() {
        let export = "id1\tReversed\tDeck\tI loose\tλύω\ttag\n";
        let map: FieldMap = serde_json::from_str(
            r#"{"models": {"Reversed": {"target_field_index": 1, "gloss_field_index": 0}}}"#,
        )
        .unwrap();
        let index = index_export(export, &map, None);
        assert_eq!(index.notes()[0].greek_text, "λύω");
        assert_eq!(index.notes()[0].english_text, "I loose");
    }

    #[test]
    fn test_out_of_range_field_index_yields_empty() {
        let map: FieldMap =
            serde_json::from_str(r#"{"defaults": {"gloss_field_index": 9}}"#).unwrap();
        let index = index_export(EXPORT, &map, None);
        assert_eq!(index.notes()[0].english_text, "");
        // The note is still recorded and the Greek side still indexed.
        assert!(index.exact_matches("λυω").is_some());
    }

    #[test]
    fn test_short_lines_skipped() {
        let export = "only\tthree\tcolumns\nid1\tBasic\tDeck\tλύω\tgloss\ttag\n";
        let index = index_export(export, &FieldMap::default(), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_missing_export_file_degrades_to_empty_index() {
        let index = build_from_export(
            Path::new("/nonexistent/export.txt"),
            &FieldMap::default(),
            None,
        );
        assert!(index.is_empty());
    }

    #[test]
    fn test_field_map_load_missing_is_default() {
        let map = FieldMap::load(Path::new("/nonexistent/map.json")).unwrap();
        assert_eq!(map.defaults.target_field_index, 0);
        assert_eq!(map.defaults.gloss_field_index, 1);
        assert!(!map.defaults.ignore);
    }

    #[test]
    fn test_field_map_load_invalid_json_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[1, 2, 3]").unwrap();
        std::io::Write::flush(&mut file).unwrap();

        assert!(matches!(
            FieldMap::load(file.path()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_clean_field_text() {
        assert_eq!(clean_field_text(""), "");
        assert_eq!(clean_field_text("λύω [sound:lyo.mp3]"), "λύω");
        assert_eq!(clean_field_text("<i>καί</i> δέ"), "καί δέ");
        assert_eq!(clean_field_text("fish &amp; chips"), "fish & chips");
    }
}
