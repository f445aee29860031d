//! Context-richness analysis.
//!
//! Classifies cards by how much surrounding context the front text
//! gives the learner: isolated vocabulary, short phrase fragments, or
//! sentence-level context.

// Static patterns are guaranteed to compile, so expect() is safe here.
#![allow(clippy::expect_used)]

use crate::normalize::normalize_nfc;
use once_cell::sync::Lazy;
use regex::Regex;

static CLOZE_UNWRAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{c\d+::([^}]+)\}\}").expect("static regex: cloze unwrap"));
static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("static regex: non-word chars"));

/// Contextual richness classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextLevel {
    /// Full sentence or substantial phrase (5+ tokens).
    RichContext,
    /// Short phrase with sentence punctuation.
    MinimalContext,
    /// Short phrase without sentence structure.
    PhraseFragment,
    /// Single word or empty.
    Isolated,
}

impl ContextLevel {
    /// Returns the level as its report string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RichContext => "rich_context",
            Self::MinimalContext => "minimal_context",
            Self::PhraseFragment => "phrase_fragment",
            Self::Isolated => "isolated",
        }
    }
}

/// What to do about a card's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRecommendation {
    /// Context is sufficient.
    Good,
    /// Could be improved.
    ConsiderEnhancing,
    /// Needs surrounding context before it is a useful card.
    NeedsContext,
}

impl ContextRecommendation {
    /// Returns the recommendation as its report string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::ConsiderEnhancing => "consider_enhancing",
            Self::NeedsContext => "needs_context",
        }
    }
}

/// Result of context analysis for a single card.
#[derive(Debug, Clone)]
pub struct ContextAnalysis {
    /// Richness classification.
    pub level: ContextLevel,
    /// Number of word tokens on the front.
    pub token_count: usize,
    /// Suggested action.
    pub recommendation: ContextRecommendation,
}

/// Tokenizes front text for context counting.
///
/// Cloze deletions are unwrapped to their content so a clozed sentence
/// counts its full length; punctuation-only tokens are dropped.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize_nfc(text);
    let unwrapped = CLOZE_UNWRAP_RE.replace_all(&normalized, "$1");

    unwrapped
        .split_whitespace()
        .filter_map(|token| {
            let cleaned = NON_WORD_RE.replace_all(token, "").to_string();
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        })
        .collect()
}

/// Returns true if the text contains sentence-level punctuation.
///
/// Includes the Greek question mark (`;`) and ano teleia (`·`).
#[must_use]
pub fn has_sentence_markers(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '.' | ',' | ';' | '·' | ':' | '!' | '?'))
}

/// Classifies the contextual richness of a card front.
#[must_use]
pub fn classify_context(greek_text: &str) -> ContextAnalysis {
    let tokens = tokenize(greek_text);
    let token_count = tokens.len();
    let has_punct = has_sentence_markers(greek_text);

    let (level, recommendation) = match token_count {
        count if count >= 5 => (ContextLevel::RichContext, ContextRecommendation::Good),
        count if count >= 3 => {
            if has_punct {
                // Likely a sentence fragment; acceptable.
                (ContextLevel::MinimalContext, ContextRecommendation::Good)
            } else {
                (
                    ContextLevel::PhraseFragment,
                    ContextRecommendation::ConsiderEnhancing,
                )
            }
        },
        2 => (
            ContextLevel::PhraseFragment,
            ContextRecommendation::ConsiderEnhancing,
        ),
        _ => (ContextLevel::Isolated, ContextRecommendation::NeedsContext),
    };

    ContextAnalysis {
        level,
        token_count,
        recommendation,
    }
}
