//! Tiered duplicate detection.
//!
//! Strict priority order, first match wins, no accumulation across
//! tiers: exact Greek (high), lemma (medium), English gloss (low),
//! then none. The same ladder runs against the persistent deck index,
//! against the deck itself (self-check), and against ephemeral
//! in-batch indexes for candidate self-duplicates.

use crate::deck::{DeckIndex, NoteId, gloss_key};
use crate::detect::types::{
    CandidateCard, DetectionResult, MatchReason, SelfDuplicate, WarningLevel,
};
use crate::lemma::LemmaProvider;
use crate::normalize::normalize_for_match;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::instrument;

/// The three matching keys derived from one card.
struct CardKeys {
    greek: String,
    lemma: String,
    gloss: String,
}

impl CardKeys {
    fn derive(front: &str, back: &str, lemmas: &LemmaProvider) -> Self {
        let greek = normalize_for_match(front);
        let lemma = if front.is_empty() {
            String::new()
        } else {
            normalize_for_match(&lemmas.best_lemma(front))
        };
        Self {
            greek,
            lemma,
            gloss: gloss_key(back),
        }
    }
}

/// Resolves the tier ladder over pre-computed hit lists.
///
/// Hit lists arrive already sorted and already excluding any self-match;
/// the first non-empty tier wins.
fn resolve_tiers(
    exact_hits: Vec<String>,
    lemma_hits: Vec<String>,
    gloss_hits: Vec<String>,
) -> (WarningLevel, MatchReason, String) {
    if !exact_hits.is_empty() {
        return (
            WarningLevel::High,
            MatchReason::ExactGreekMatch,
            exact_hits.join(","),
        );
    }
    if !lemma_hits.is_empty() {
        return (
            WarningLevel::Medium,
            MatchReason::LemmaMatch,
            lemma_hits.join(","),
        );
    }
    if !gloss_hits.is_empty() {
        return (
            WarningLevel::Low,
            MatchReason::EnglishGlossMatch,
            gloss_hits.join(","),
        );
    }
    (WarningLevel::None, MatchReason::NoMatch, String::new())
}

/// Collects deck hits for a key, excluding `exclude` when given.
fn deck_hits(
    ids: Option<&BTreeSet<NoteId>>,
    key: &str,
    exclude: Option<&NoteId>,
) -> Vec<String> {
    if key.is_empty() {
        return Vec::new();
    }
    ids.map(|set| {
        set.iter()
            .filter(|&id| exclude != Some(id))
            .map(|id| id.as_str().to_string())
            .collect()
    })
    .unwrap_or_default()
}

/// Checks each candidate against the reference deck.
///
/// Results preserve input order; one result per candidate, always.
#[instrument(skip_all, fields(candidates = candidates.len(), deck_notes = deck.len()))]
#[must_use]
pub fn analyze_candidates(
    candidates: &[CandidateCard],
    deck: &DeckIndex,
    lemmas: &LemmaProvider,
) -> Vec<DetectionResult> {
    let results: Vec<DetectionResult> = candidates
        .iter()
        .map(|card| {
            let keys = CardKeys::derive(&card.front, &card.back, lemmas);
            let (level, reason, ids) = resolve_tiers(
                deck_hits(deck.exact_matches(&keys.greek), &keys.greek, None),
                deck_hits(deck.lemma_matches(&keys.lemma), &keys.lemma, None),
                deck_hits(deck.gloss_matches(&keys.gloss), &keys.gloss, None),
            );
            DetectionResult {
                front: card.front.clone(),
                back: card.back.clone(),
                tags: card.tags.clone(),
                normalized_greek: keys.greek,
                lemma: keys.lemma,
                warning_level: level,
                match_reason: reason,
                matched_note_ids: ids,
            }
        })
        .collect();

    let duplicates = results.iter().filter(|r| r.is_duplicate()).count();
    tracing::debug!(duplicates, total = results.len(), "analyzed candidate batch");
    results
}

/// Self-checks the reference deck against its own indexes.
///
/// Each note's own id is excluded from every tier's hit set before the
/// emptiness check, so a note whose exact set contains only itself can
/// still match a lower tier. Only notes with a non-none tier produce a
/// result.
#[instrument(skip_all, fields(deck_notes = deck.len()))]
#[must_use]
pub fn analyze_deck_internal(deck: &DeckIndex, lemmas: &LemmaProvider) -> Vec<DetectionResult> {
    let mut results = Vec::new();

    for note in deck.notes() {
        let keys = CardKeys::derive(&note.greek_text, &note.english_text, lemmas);
        let own = Some(&note.note_id);
        let (level, reason, ids) = resolve_tiers(
            deck_hits(deck.exact_matches(&keys.greek), &keys.greek, own),
            deck_hits(deck.lemma_matches(&keys.lemma), &keys.lemma, own),
            deck_hits(deck.gloss_matches(&keys.gloss), &keys.gloss, own),
        );
        if level == WarningLevel::None {
            continue;
        }
        results.push(DetectionResult {
            front: note.greek_text.clone(),
            back: note.english_text.clone(),
            tags: String::new(),
            normalized_greek: keys.greek,
            lemma: keys.lemma,
            warning_level: level,
            match_reason: reason,
            matched_note_ids: ids,
        });
    }

    tracing::debug!(duplicates = results.len(), "deck self-check complete");
    results
}

/// Finds duplicates within the candidate batch itself.
///
/// Builds three ephemeral indexes keyed by batch row index with the same
/// key derivation as the deck index, then runs the tier ladder per
/// candidate with its own row excluded. Reported row numbers are
/// 1-indexed relative to the original input including the header row
/// (row index + 2).
#[instrument(skip_all, fields(candidates = candidates.len()))]
#[must_use]
pub fn analyze_self_duplicates(
    candidates: &[CandidateCard],
    lemmas: &LemmaProvider,
) -> BTreeMap<usize, SelfDuplicate> {
    let keys: Vec<CardKeys> = candidates
        .iter()
        .map(|card| CardKeys::derive(&card.front, &card.back, lemmas))
        .collect();

    let mut exact: HashMap<&str, BTreeSet<usize>> = HashMap::new();
    let mut lemma: HashMap<&str, BTreeSet<usize>> = HashMap::new();
    let mut gloss: HashMap<&str, BTreeSet<usize>> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        if !key.greek.is_empty() {
            exact.entry(&key.greek).or_default().insert(row);
        }
        if !key.lemma.is_empty() {
            lemma.entry(&key.lemma).or_default().insert(row);
        }
        if !key.gloss.is_empty() {
            gloss.entry(&key.gloss).or_default().insert(row);
        }
    }

    let batch_hits = |index: &HashMap<&str, BTreeSet<usize>>, key: &str, own: usize| {
        if key.is_empty() {
            return Vec::new();
        }
        index
            .get(key)
            .map(|rows| {
                rows.iter()
                    .filter(|&&row| row != own)
                    .map(|row| (row + 2).to_string())
                    .collect()
            })
            .unwrap_or_default()
    };

    let mut matches = BTreeMap::new();
    for (row, key) in keys.iter().enumerate() {
        let (level, reason, rows) = resolve_tiers(
            batch_hits(&exact, &key.greek, row),
            batch_hits(&lemma, &key.lemma, row),
            batch_hits(&gloss, &key.gloss, row),
        );
        if level == WarningLevel::None {
            continue;
        }
        matches.insert(
            row,
            SelfDuplicate {
                level,
                reason,
                rows,
            },
        );
    }

    tracing::debug!(duplicates = matches.len(), "batch self-duplicate check complete");
    matches
}
