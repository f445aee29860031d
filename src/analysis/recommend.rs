//! Cloze conversion recommendations.
//!
//! Identifies cards with enough context to benefit from cloze deletion
//! format and suggests which word to delete, with a confidence score.

// Static patterns are guaranteed to compile, so expect() is safe here.
#![allow(clippy::expect_used)]

use crate::analysis::context::{ContextLevel, classify_context, tokenize};
use crate::detect::WarningLevel;
use once_cell::sync::Lazy;
use regex::Regex;

static ALREADY_CLOZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{c\d+::").expect("static regex: cloze marker"));

/// Article forms that should not be cloze targets.
static ARTICLE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[οὁ]$",
        r"^[ηἡ]$",
        r"^[τὸτό]$",
        r"^τ[οόηἡ]ν$",
        r"^το[ῦυ]$",
        r"^τ[ῷω]$",
        r"^ο[ιί]$",
        r"^α[ιί]$",
        r"^τ[αά]$",
        r"^το[υύ]ς$",
        r"^τ[αά]ς$",
        r"^των$",
        r"^το[ιί]ς$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex: article form"))
    .collect()
});

/// What kind of cloze deletion is being suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClozeType {
    /// Main vocabulary word.
    TargetWord,
    /// Verb form, for drilling conjugations.
    Morphology,
    /// No suggestion.
    None,
}

impl ClozeType {
    /// Returns the type as its report string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TargetWord => "target_word",
            Self::Morphology => "morphology",
            Self::None => "none",
        }
    }
}

/// Recommendation for converting a card to cloze format.
#[derive(Debug, Clone)]
pub struct ClozeRecommendation {
    /// Whether conversion is recommended.
    pub should_cloze: bool,
    /// Kind of deletion suggested.
    pub cloze_type: ClozeType,
    /// The word to delete.
    pub suggested_deletion: String,
    /// Generated front text with the deletion applied.
    pub suggested_front: String,
    /// Suggested hint text.
    pub hint: String,
    /// Confidence score, 0.0–1.0.
    pub confidence: f64,
    /// Why this recommendation was made (or withheld).
    pub reason: String,
}

impl ClozeRecommendation {
    fn declined(reason: &str) -> Self {
        Self {
            should_cloze: false,
            cloze_type: ClozeType::None,
            suggested_deletion: String::new(),
            suggested_front: String::new(),
            hint: String::new(),
            confidence: 0.0,
            reason: reason.to_string(),
        }
    }
}

/// Returns true if the text already contains cloze syntax.
#[must_use]
pub fn is_already_cloze(text: &str) -> bool {
    ALREADY_CLOZE_RE.is_match(text)
}

fn is_article(token: &str) -> bool {
    let lower = token.to_lowercase();
    ARTICLE_RES.iter().any(|re| re.is_match(&lower))
}

/// Identifies the most likely target word for a cloze deletion.
///
/// Verb-tagged cards prefer an early token (verbs tend to lead Greek
/// sentences); otherwise the last non-article token wins, falling back
/// to the last token overall.
#[must_use]
pub fn identify_target_word(tokens: &[String], tags: &str) -> Option<String> {
    if tokens.is_empty() {
        return None;
    }

    let non_article: Vec<&String> = tokens.iter().filter(|t| !is_article(t)).collect();

    if non_article.len() == 1 {
        return Some(non_article[0].clone());
    }

    if tags.to_lowercase().contains("verb") {
        for token in tokens.iter().take(2) {
            if !is_article(token) {
                return Some(token.clone());
            }
        }
    }

    non_article
        .last()
        .map(|t| (*t).clone())
        .or_else(|| tokens.last().cloned())
}

/// Recommends whether to convert a card to cloze format.
///
/// Cards that are already cloze, have fewer than three tokens, or are
/// exact duplicates of deck notes are declined outright. Confidence
/// starts at 0.5, gains 0.3 for rich context or 0.1 for minimal
/// context, loses 0.2 when the card is a lemma-level duplicate, and
/// must reach 0.3 for a positive recommendation.
#[must_use]
pub fn recommend_cloze(front: &str, tags: &str, warning_level: WarningLevel) -> ClozeRecommendation {
    if is_already_cloze(front) {
        return ClozeRecommendation::declined("already_cloze");
    }

    let context = classify_context(front);
    if context.token_count < 3 {
        return ClozeRecommendation::declined("insufficient_context");
    }

    if warning_level == WarningLevel::High {
        // Clozing an exact duplicate would just mint another duplicate.
        return ClozeRecommendation::declined("exact_duplicate");
    }

    let mut confidence: f64 = 0.5;
    match context.level {
        ContextLevel::RichContext => confidence += 0.3,
        ContextLevel::MinimalContext => confidence += 0.1,
        ContextLevel::PhraseFragment | ContextLevel::Isolated => {},
    }
    if warning_level == WarningLevel::Medium {
        confidence -= 0.2;
    }

    let tokens = tokenize(front);
    let Some(target) = identify_target_word(&tokens, tags) else {
        return ClozeRecommendation::declined("no_clear_target");
    };

    let (cloze_type, hint) = if tags.to_lowercase().contains("verb") {
        (ClozeType::Morphology, "verb form")
    } else if tags.to_lowercase().contains("noun") || tags.to_lowercase().contains("adjective") {
        (ClozeType::TargetWord, "target word")
    } else {
        (ClozeType::TargetWord, "")
    };

    let suggested_front = front.replacen(&target, &format!("{{{{c1::{target}}}}}"), 1);

    ClozeRecommendation {
        should_cloze: confidence >= 0.3,
        cloze_type,
        suggested_deletion: target,
        suggested_front,
        hint: hint.to_string(),
        confidence,
        reason: format!(
            "context_{}_tokens_{}",
            context.level.as_str(),
            context.token_count
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_cloze_declined() {
        let rec = recommend_cloze("ὁ ἄνθρωπος {{c1::βαίνει}} πρὸς τὸν ἀγρόν", "", WarningLevel::None);
        assert!(!rec.should_cloze);
        assert_eq!(rec.reason, "already_cloze");
    }

    #[test]
    fn test_isolated_word_declined() {
        let rec = recommend_cloze("λύω", "", WarningLevel::None);
        assert!(!rec.should_cloze);
        assert_eq!(rec.reason, "insufficient_context");
    }

    #[test]
    fn test_two_word_phrase_declined() {
        let rec = recommend_cloze("ὁ ἀγρός", "noun", WarningLevel::None);
        assert!(!rec.should_cloze);
        assert_eq!(rec.reason, "insufficient_context");
    }

    #[test]
    fn test_exact_duplicate_declined() {
        let rec = recommend_cloze(
            "ὁ ἄνθρωπος βαίνει πρὸς τὸν ἀγρόν",
            "",
            WarningLevel::High,
        );
        assert!(!rec.should_cloze);
        assert_eq!(rec.reason, "exact_duplicate");
    }

    #[test]
    fn test_rich_context_recommended() {
        let rec = recommend_cloze(
            "ὁ ἄνθρωπος βαίνει πρὸς τὸν ἀγρόν",
            "",
            WarningLevel::None,
        );
        assert!(rec.should_cloze);
        assert!((rec.confidence - 0.8).abs() < 1e-9);
        assert!(rec.reason.starts_with("context_rich_context"));
    }

    #[test]
    fn test_lemma_duplicate_reduces_confidence() {
        let rec = recommend_cloze(
            "ὁ ἄνθρωπος βαίνει πρὸς τὸν ἀγρόν",
            "",
            WarningLevel::Medium,
        );
        assert!(rec.should_cloze);
        assert!((rec.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_verb_tag_prefers_early_token() {
        let rec = recommend_cloze("ἕλκουσι τὸ ἄροτρον τῷ ἀγρῷ", "verb", WarningLevel::None);
        assert_eq!(rec.suggested_deletion, "ἕλκουσι");
        assert_eq!(rec.cloze_type, ClozeType::Morphology);
        assert_eq!(rec.hint, "verb form");
    }

    #[test]
    fn test_default_targets_last_non_article() {
        let rec = recommend_cloze("βαίνει πρὸς τὸν ἀγρόν", "noun", WarningLevel::None);
        assert_eq!(rec.suggested_deletion, "ἀγρόν");
        assert_eq!(rec.cloze_type, ClozeType::TargetWord);
    }

    #[test]
    fn test_suggested_front_wraps_target() {
        let rec = recommend_cloze(
            "ὁ ἄνθρωπος βαίνει πρὸς τὸν ἀγρόν",
            "",
            WarningLevel::None,
        );
        assert!(rec.suggested_front.contains(&format!(
            "{{{{c1::{}}}}}",
            rec.suggested_deletion
        )));
    }

    #[test]
    fn test_identify_single_non_article() {
        let tokens = tokenize("ὁ ἀγρός");
        assert_eq!(identify_target_word(&tokens, ""), Some("ἀγρός".to_string()));
    }

    #[test]
    fn test_identify_empty_tokens() {
        assert_eq!(identify_target_word(&[], ""), None);
    }
}
