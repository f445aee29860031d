//! Unicode and Greek-specific normalization for matching.
//!
//! All matching keys in the deck index and the duplicate detector are
//! produced here. The pipeline is NFC early for consistency, then
//! lowercase, punctuation-to-space, combining-mark stripping, final-sigma
//! folding, and whitespace collapsing.
//!
//! Every function is pure and total; `normalize_for_match` is idempotent.

use unicode_general_category::{GeneralCategory, get_general_category};
use unicode_normalization::UnicodeNormalization;

/// Applies Unicode canonical composition (NFC).
///
/// Stabilizes precomposed vs. decomposed accented forms so that equal
/// surface text produces byte-equal strings.
///
/// # Example
///
/// ```rust
/// use hoplite::normalize::normalize_nfc;
///
/// // υ + combining acute (U+0301) composes to precomposed ύ
/// assert_eq!(normalize_nfc("λ\u{03C5}\u{0301}ω"), "λύω");
/// ```
#[must_use]
pub fn normalize_nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Removes combining marks by NFD decomposition, then recomposes to NFC.
///
/// Strips acute, grave, circumflex, breathing marks, and iota subscripts
/// while preserving the base letters.
///
/// # Example
///
/// ```rust
/// use hoplite::normalize::strip_accents;
///
/// assert_eq!(strip_accents("λύω"), "λυω");
/// assert_eq!(strip_accents("εἶπον"), "ειπον");
/// ```
#[must_use]
pub fn strip_accents(text: &str) -> String {
    // Decompose first to expose combining marks consistently.
    let stripped: String = text
        .nfc()
        .collect::<String>()
        .nfd()
        .filter(|&c| get_general_category(c) != GeneralCategory::NonspacingMark)
        .collect();
    // Recompose to NFC for a stable representation.
    stripped.nfc().collect()
}

/// Returns true if the character is punctuation (Unicode category `P*`).
#[must_use]
pub fn is_punctuation(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
    )
}

/// Returns true if the token is empty or contains only punctuation.
#[must_use]
pub fn is_pure_punctuation(token: &str) -> bool {
    token.chars().all(is_punctuation)
}

/// Strips leading and trailing punctuation from a token.
#[must_use]
pub fn trim_punctuation(token: &str) -> &str {
    token.trim_matches(is_punctuation)
}

/// Returns true if the character lies in the Greek or Greek Extended
/// (polytonic) blocks.
#[must_use]
pub const fn is_greek_letter(c: char) -> bool {
    matches!(c, '\u{0370}'..='\u{03FF}' | '\u{1F00}'..='\u{1FFF}')
}

/// Returns true if the token contains at least one Greek letter.
#[must_use]
pub fn contains_greek(token: &str) -> bool {
    token.chars().any(is_greek_letter)
}

/// Normalizes Greek text into a matching key.
///
/// Steps, in order: NFC, lowercase, punctuation to space, strip combining
/// marks, fold final sigma (`ς` → `σ`), collapse whitespace and trim.
///
/// The sigma fold applies to every occurrence of `ς`, not only true
/// word-final positions; downstream index keys depend on this.
///
/// # Example
///
/// ```rust
/// use hoplite::normalize::normalize_for_match;
///
/// assert_eq!(normalize_for_match("Λύω"), "λυω");
/// assert_eq!(normalize_for_match("λόγος"), "λογοσ");
/// assert_eq!(normalize_for_match("  λύω,  καί  "), "λυω και");
/// ```
#[must_use]
pub fn normalize_for_match(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let t = normalize_nfc(text);
    let t = t.to_lowercase();
    let t: String = t
        .chars()
        .map(|c| if is_punctuation(c) { ' ' } else { c })
        .collect();
    let t = strip_accents(&t);
    let t = t.replace('ς', "σ");
    collapse_whitespace(&t)
}

/// Collapses runs of whitespace to single spaces and trims the ends.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
