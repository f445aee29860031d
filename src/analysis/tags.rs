//! Tag hygiene enforcement.
//!
//! Allowlist/blocklist enforcement, unknown-tag flagging for manual
//! review, and pattern-based auto-tagging driven by a JSON schema file.

use crate::deck::gloss_key;
use crate::normalize::normalize_for_match;
use crate::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Which card field an auto-tag rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    /// Normalized Greek front text.
    Front,
    /// Lowercased English back text.
    Back,
}

/// One pattern-based auto-tagging rule.
#[derive(Debug, Clone)]
pub struct AutoTagRule {
    /// Human-readable rule identifier.
    pub name: String,
    /// Compiled pattern, matched against the selected field.
    pattern: Regex,
    /// Tags to add when the pattern matches.
    pub tags: Vec<String>,
    /// Field the pattern runs against.
    pub match_field: MatchField,
}

/// Tag schema configuration.
#[derive(Debug, Clone)]
pub struct TagSchema {
    allowed_tags: HashSet<String>,
    blocked_tags: HashSet<String>,
    case_sensitive: bool,
    normalize_tags: bool,
    auto_tag_rules: Vec<AutoTagRule>,
}

/// Raw schema file shape before pattern compilation.
#[derive(Deserialize)]
struct RawSchema {
    #[serde(default)]
    allowed_tags: Vec<String>,
    #[serde(default)]
    blocked_tags: Vec<String>,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default = "default_true")]
    normalize_tags: bool,
    #[serde(default)]
    auto_tag_rules: Vec<RawRule>,
}

#[derive(Deserialize)]
struct RawRule {
    name: String,
    pattern: String,
    tags: Vec<String>,
    #[serde(default = "default_match_field")]
    match_field: MatchField,
}

const fn default_true() -> bool {
    true
}

const fn default_match_field() -> MatchField {
    MatchField::Front
}

/// Complete tag analysis for a single card.
#[derive(Debug, Clone)]
pub struct TagAnalysis {
    /// Original tags string from the card.
    pub original_tags: String,
    /// Tags that passed the allowlist check.
    pub kept: Vec<String>,
    /// Blocked tags that were removed.
    pub deleted: Vec<String>,
    /// Tags in neither list; need manual review.
    pub unknown: Vec<String>,
    /// Tags added by auto-tagging rules.
    pub auto_added: Vec<String>,
    /// Kept + auto-added tags combined.
    pub final_tags: Vec<String>,
    /// True when unknown tags exist.
    pub needs_review: bool,
}

/// Splits an Anki tag string into individual tags.
///
/// Anki uses space-separated tags; empty segments are dropped.
#[must_use]
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split_whitespace().map(ToString::to_string).collect()
}

/// Joins tags back into Anki's space-separated format.
#[must_use]
pub fn format_tags(tags: &[String]) -> String {
    tags.join(" ")
}

fn normalize_tag(tag: &str, normalize: bool, case_sensitive: bool) -> String {
    let tag = if normalize { tag.trim() } else { tag };
    if case_sensitive {
        tag.to_string()
    } else {
        tag.to_lowercase()
    }
}

fn dedup_preserving_order(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

impl TagSchema {
    /// Loads a tag schema from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::OperationFailed` when the file cannot be read and
    /// `Error::InvalidInput` when the JSON is malformed or an auto-tag
    /// pattern fails to compile. Schema problems are fatal: silently
    /// dropping hygiene rules would defeat the point of having them.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_tag_schema".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let raw: RawSchema = serde_json::from_str(&contents).map_err(|e| {
            Error::InvalidInput(format!("invalid tag schema JSON in {}: {e}", path.display()))
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSchema) -> Result<Self> {
        let fold = |tags: Vec<String>| -> HashSet<String> {
            if raw.case_sensitive {
                tags.into_iter().collect()
            } else {
                tags.into_iter().map(|t| t.to_lowercase()).collect()
            }
        };

        let mut auto_tag_rules = Vec::with_capacity(raw.auto_tag_rules.len());
        for rule in raw.auto_tag_rules {
            let pattern = Regex::new(&rule.pattern).map_err(|e| {
                Error::InvalidInput(format!("invalid regex in rule '{}': {e}", rule.name))
            })?;
            auto_tag_rules.push(AutoTagRule {
                name: rule.name,
                pattern,
                tags: rule.tags,
                match_field: rule.match_field,
            });
        }

        Ok(Self {
            allowed_tags: fold(raw.allowed_tags),
            blocked_tags: fold(raw.blocked_tags),
            case_sensitive: raw.case_sensitive,
            normalize_tags: raw.normalize_tags,
            auto_tag_rules,
        })
    }

    /// Builds a schema from in-memory parts. Primarily for tests.
    #[must_use]
    pub fn from_parts(
        allowed: &[&str],
        blocked: &[&str],
        auto_tag_rules: Vec<AutoTagRule>,
    ) -> Self {
        Self {
            allowed_tags: allowed.iter().map(|t| t.to_lowercase()).collect(),
            blocked_tags: blocked.iter().map(|t| t.to_lowercase()).collect(),
            case_sensitive: false,
            normalize_tags: true,
            auto_tag_rules,
        }
    }

    /// Analyzes a card's tags, optionally applying auto-tagging rules.
    #[must_use]
    pub fn analyze_card_tags(
        &self,
        front: &str,
        back: &str,
        tags: &str,
        enable_auto_tag: bool,
    ) -> TagAnalysis {
        let mut kept = Vec::new();
        let mut deleted = Vec::new();
        let mut unknown = Vec::new();

        for tag in parse_tags(tags) {
            let norm = normalize_tag(&tag, self.normalize_tags, self.case_sensitive);
            if self.allowed_tags.contains(&norm) {
                kept.push(norm);
            } else if self.blocked_tags.contains(&norm) {
                deleted.push(norm);
            } else {
                unknown.push(norm);
            }
        }

        let kept = dedup_preserving_order(kept);
        let deleted = dedup_preserving_order(deleted);
        let unknown = dedup_preserving_order(unknown);

        let auto_added = if enable_auto_tag {
            let existing: HashSet<String> = kept.iter().cloned().collect();
            self.apply_auto_tagging(front, back, &existing)
        } else {
            Vec::new()
        };

        let mut final_tags = kept.clone();
        final_tags.extend(auto_added.iter().cloned());
        let needs_review = !unknown.is_empty();

        TagAnalysis {
            original_tags: tags.to_string(),
            kept,
            deleted,
            unknown,
            auto_added,
            final_tags,
            needs_review,
        }
    }

    /// Applies auto-tag rules, returning tags to add.
    ///
    /// A rule's tag is added only when it is allowlisted, not blocked,
    /// and not already on the card.
    fn apply_auto_tagging(
        &self,
        front: &str,
        back: &str,
        existing: &HashSet<String>,
    ) -> Vec<String> {
        let normalized_front = normalize_for_match(front);
        let normalized_back = gloss_key(back);

        let mut auto_added = Vec::new();
        for rule in &self.auto_tag_rules {
            let haystack = match rule.match_field {
                MatchField::Front => &normalized_front,
                MatchField::Back => &normalized_back,
            };
            if !rule.pattern.is_match(haystack) {
                continue;
            }
            for tag in &rule.tags {
                let norm = normalize_tag(tag, self.normalize_tags, self.case_sensitive);
                if self.allowed_tags.contains(&norm)
                    && !self.blocked_tags.contains(&norm)
                    && !existing.contains(&norm)
                {
                    auto_added.push(norm);
                }
            }
        }

        dedup_preserving_order(auto_added)
    }

    /// Number of allowlisted tags.
    #[must_use]
    pub fn allowed_count(&self) -> usize {
        self.allowed_tags.len()
    }
}
