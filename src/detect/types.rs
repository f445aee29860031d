//! Duplicate-detection result types.

use serde::{Deserialize, Serialize};

/// A candidate card under analysis.
///
/// Missing fields are represented as empty strings; nothing in the
/// detector errors on malformed card data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateCard {
    /// Greek text (front of card).
    pub front: String,
    /// English translation (back of card).
    pub back: String,
    /// Space-separated Anki tags.
    pub tags: String,
}

impl CandidateCard {
    /// Creates a candidate card.
    #[must_use]
    pub fn new(
        front: impl Into<String>,
        back: impl Into<String>,
        tags: impl Into<String>,
    ) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            tags: tags.into(),
        }
    }
}

/// Duplicate-match confidence tier.
///
/// Ordered by severity: `None < Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    /// No hit in any index.
    None,
    /// Same English gloss on a different Greek word.
    Low,
    /// Same lemma, different inflection.
    Medium,
    /// Exact Greek string duplicate.
    High,
}

impl WarningLevel {
    /// Returns the level as its report string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which index produced the winning match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchReason {
    /// Exact normalized-Greek hit.
    ExactGreekMatch,
    /// Lemma-index hit.
    LemmaMatch,
    /// English-gloss hit.
    EnglishGlossMatch,
    /// Nothing matched.
    NoMatch,
}

impl MatchReason {
    /// Returns the reason as its report string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactGreekMatch => "exact-greek-match",
            Self::LemmaMatch => "lemma-match",
            Self::EnglishGlossMatch => "english-gloss-match",
            Self::NoMatch => "no-match",
        }
    }
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of checking one candidate against the reference deck.
///
/// Created fresh per analysis call and never mutated afterwards.
/// Feature analyses (tag hygiene, cloze quality, and so on) attach
/// alongside this record rather than widening it; see `lint::CardReport`.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    /// Candidate front text, as ingested.
    pub front: String,
    /// Candidate back text, as ingested.
    pub back: String,
    /// Candidate tags, as ingested.
    pub tags: String,
    /// Normalized Greek matching key.
    pub normalized_greek: String,
    /// Resolved lemma (normalized), or empty.
    pub lemma: String,
    /// Winning tier.
    pub warning_level: WarningLevel,
    /// Which index matched.
    pub match_reason: MatchReason,
    /// Comma-joined note ids at the winning tier, sorted.
    pub matched_note_ids: String,
}

impl DetectionResult {
    /// Returns true if any tier matched.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        !matches!(self.warning_level, WarningLevel::None)
    }
}

/// A duplicate found between two cards of the same input batch.
#[derive(Debug, Clone, Serialize)]
pub struct SelfDuplicate {
    /// Winning tier against the in-batch indexes.
    pub level: WarningLevel,
    /// Which in-batch index matched.
    pub reason: MatchReason,
    /// Comma-joined 1-indexed row numbers of the matching candidates,
    /// offset by the assumed header row (row index + 2).
    pub rows: String,
}
