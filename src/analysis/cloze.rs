//! Cloze quality validation.
//!
//! Parses Anki cloze syntax (`{{c1::word}}`, `{{c1::word::hint}}`) and
//! scores each cloze card on context token count, deletion density, and
//! content-word density.

// Static patterns are guaranteed to compile, so expect() is safe here.
#![allow(clippy::expect_used)]

use crate::normalize::{is_pure_punctuation, normalize_for_match, normalize_nfc};
use crate::stopwords::StopWords;
use once_cell::sync::Lazy;
use regex::Regex;

static CLOZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{c(\d+)::([^:}]+?)(?:::([^}]+?))?\}\}").expect("static regex: cloze syntax")
});
static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex: inline HTML tag"));
static SOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[sound:[^\]]+\]").expect("static regex: sound reference"));

/// A single cloze deletion segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClozeSegment {
    /// Deletion number (the `1` in `{{c1::...}}`).
    pub number: u32,
    /// Text inside the deletion, before any hint.
    pub content: String,
    /// Hint text after `::`, or empty.
    pub hint: String,
}

/// Parsed cloze structure of a field.
#[derive(Debug, Clone)]
pub struct ClozeParse {
    /// Whether any cloze deletion was found.
    pub is_cloze: bool,
    /// Deletions in order of appearance.
    pub segments: Vec<ClozeSegment>,
    /// Text outside the deletions, markup stripped.
    pub context_text: String,
}

/// Quality classification for a cloze card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClozeQuality {
    /// Ample context, modest deletion, substantive words.
    Excellent,
    /// Enough context to anchor recall.
    Good,
    /// Usable but thin.
    Weak,
    /// Little or no usable context.
    Poor,
    /// Not a cloze card.
    NotApplicable,
}

impl ClozeQuality {
    /// Returns the quality as its report string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Weak => "weak",
            Self::Poor => "poor",
            Self::NotApplicable => "n/a",
        }
    }
}

impl std::fmt::Display for ClozeQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete cloze analysis for a single card.
#[derive(Debug, Clone)]
pub struct ClozeAnalysis {
    /// Whether the card contains cloze deletions.
    pub is_cloze: bool,
    /// All Greek tokens in the field.
    pub total_tokens: usize,
    /// Greek tokens outside the deletions.
    pub context_tokens: usize,
    /// Greek tokens inside the deletions.
    pub cloze_tokens: usize,
    /// Fraction of tokens deleted (0.0–1.0).
    pub deletion_ratio: f64,
    /// Stop words among the context tokens.
    pub context_stop_words: usize,
    /// Content words among the context tokens.
    pub context_content_words: usize,
    /// Content words over all context words (0.0–1.0).
    pub content_word_density: f64,
    /// Quality classification.
    pub quality: ClozeQuality,
    /// Reason codes explaining a weak/poor classification.
    pub reasons: Vec<&'static str>,
}

/// Parses cloze syntax from a field, stripping HTML and sound markup
/// first.
#[must_use]
pub fn parse_cloze(text: &str) -> ClozeParse {
    if text.is_empty() {
        return ClozeParse {
            is_cloze: false,
            segments: Vec::new(),
            context_text: String::new(),
        };
    }

    let cleaned = SOUND_RE.replace_all(text, "");
    let cleaned = HTML_TAG_RE.replace_all(&cleaned, "");

    let segments: Vec<ClozeSegment> = CLOZE_RE
        .captures_iter(&cleaned)
        .map(|caps| ClozeSegment {
            number: caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0),
            content: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            hint: caps.get(3).map_or("", |m| m.as_str()).trim().to_string(),
        })
        .collect();

    let context_text = CLOZE_RE.replace_all(&cleaned, "").to_string();
    let is_cloze = !segments.is_empty();

    ClozeParse {
        is_cloze,
        segments,
        context_text,
    }
}

/// Tokenizes Greek text: NFC, markup stripped, whitespace split,
/// pure-punctuation tokens dropped.
#[must_use]
pub fn tokenize_greek(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let t = normalize_nfc(text);
    let t = SOUND_RE.replace_all(&t, "");
    let t = HTML_TAG_RE.replace_all(&t, "");
    t.split_whitespace()
        .filter(|tok| !is_pure_punctuation(tok))
        .map(ToString::to_string)
        .collect()
}

/// Counts stop words vs content words, normalizing each token first.
#[must_use]
pub fn count_stop_words(tokens: &[String], stopwords: &StopWords) -> (usize, usize) {
    let mut stop = 0;
    let mut content = 0;
    for token in tokens {
        if stopwords.is_stop_word(&normalize_for_match(token)) {
            stop += 1;
        } else {
            content += 1;
        }
    }
    (stop, content)
}

/// Classifies cloze quality from the three metrics.
///
/// Thresholds: excellent needs ≥5 context tokens, ≤50% deletion, and
/// ≥0.40 content density; good needs ≥3, ≤60%, ≥0.30; weak needs ≥2
/// context tokens or ≥1 with ≤80% deletion; everything else is poor.
#[must_use]
pub fn classify_quality(
    context_tokens: usize,
    deletion_ratio: f64,
    content_density: f64,
) -> (ClozeQuality, Vec<&'static str>) {
    if context_tokens >= 5 && deletion_ratio <= 0.50 && content_density >= 0.40 {
        return (ClozeQuality::Excellent, Vec::new());
    }

    if context_tokens >= 3 && deletion_ratio <= 0.60 && content_density >= 0.30 {
        return (ClozeQuality::Good, Vec::new());
    }

    if context_tokens >= 2 || (context_tokens >= 1 && deletion_ratio <= 0.80) {
        let mut reasons = Vec::new();
        if context_tokens < 3 {
            reasons.push("low_context");
        }
        if deletion_ratio > 0.50 {
            reasons.push("high_deletion");
        }
        if content_density < 0.30 {
            reasons.push("low_content_density");
        }
        return (ClozeQuality::Weak, reasons);
    }

    let mut reasons = Vec::new();
    if context_tokens == 0 {
        reasons.push("no_context");
    } else if context_tokens == 1 {
        reasons.push("minimal_context");
    }
    if deletion_ratio > 0.80 {
        reasons.push("very_high_deletion");
    }
    if content_density == 0.0 && context_tokens > 0 {
        reasons.push("all_stop_words");
    }
    (ClozeQuality::Poor, reasons)
}

/// Analyzes a single card's cloze quality.
///
/// Non-cloze cards report `n/a` with zeroed metrics.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Token counts are tiny
pub fn analyze_cloze_card(front: &str, stopwords: &StopWords) -> ClozeAnalysis {
    let parse = parse_cloze(front);

    if !parse.is_cloze {
        return ClozeAnalysis {
            is_cloze: false,
            total_tokens: 0,
            context_tokens: 0,
            cloze_tokens: 0,
            deletion_ratio: 0.0,
            context_stop_words: 0,
            context_content_words: 0,
            content_word_density: 0.0,
            quality: ClozeQuality::NotApplicable,
            reasons: Vec::new(),
        };
    }

    let context_token_list = tokenize_greek(&parse.context_text);
    let cloze_token_count: usize = parse
        .segments
        .iter()
        .map(|s| tokenize_greek(&s.content).len())
        .sum();

    let context_tokens = context_token_list.len();
    let total_tokens = context_tokens + cloze_token_count;
    let deletion_ratio = if total_tokens > 0 {
        cloze_token_count as f64 / total_tokens as f64
    } else {
        0.0
    };

    let (stop, content) = count_stop_words(&context_token_list, stopwords);
    let counted = stop + content;
    let content_word_density = if counted > 0 {
        content as f64 / counted as f64
    } else {
        0.0
    };

    let (quality, reasons) = classify_quality(context_tokens, deletion_ratio, content_word_density);

    ClozeAnalysis {
        is_cloze: true,
        total_tokens,
        context_tokens,
        cloze_tokens: cloze_token_count,
        deletion_ratio,
        context_stop_words: stop,
        context_content_words: content,
        content_word_density,
        quality,
        reasons,
    }
}
