//! Lint pipeline orchestration.
//!
//! Runs the duplicate detector over a candidate batch and attaches the
//! enabled per-card analyses. The base detection result never grows for
//! a feature's sake; each analysis rides along as an optional record.

use crate::analysis::{
    ClozeAnalysis, ClozeRecommendation, ContextAnalysis, TagAnalysis, TagSchema,
    analyze_cloze_card, classify_context, recommend_cloze,
};
use crate::deck::DeckIndex;
use crate::detect::{
    CandidateCard, DetectionResult, SelfDuplicate, analyze_candidates, analyze_self_duplicates,
};
use crate::lemma::LemmaProvider;
use crate::stopwords::StopWords;
use std::collections::BTreeMap;
use tracing::instrument;

/// Which analyses run alongside duplicate detection.
#[derive(Default)]
pub struct LintOptions {
    /// Tag schema; enables tag hygiene when present.
    pub tag_schema: Option<TagSchema>,
    /// Apply the schema's auto-tag rules.
    pub auto_tag: bool,
    /// Score cloze quality.
    pub check_cloze: bool,
    /// Classify context richness.
    pub check_context: bool,
    /// Suggest cloze conversions.
    pub recommend_cloze: bool,
    /// Skip the intra-batch self-duplicate pass.
    pub skip_self_check: bool,
}

/// Per-candidate report: the base detection result plus optional
/// feature-analysis attachments.
#[derive(Debug)]
pub struct CardReport {
    /// Duplicate detection against the reference deck.
    pub detection: DetectionResult,
    /// Duplicate found within the candidate batch, if any.
    pub self_duplicate: Option<SelfDuplicate>,
    /// Tag hygiene analysis, when a schema was supplied.
    pub tags: Option<TagAnalysis>,
    /// Cloze quality analysis, when enabled.
    pub cloze: Option<ClozeAnalysis>,
    /// Context richness analysis, when enabled.
    pub context: Option<ContextAnalysis>,
    /// Cloze conversion recommendation, when enabled.
    pub recommendation: Option<ClozeRecommendation>,
}

/// Runs the full lint pipeline over a candidate batch.
///
/// Output order matches input order, one report per candidate.
#[instrument(skip_all, fields(candidates = candidates.len()))]
#[must_use]
pub fn lint_candidates(
    candidates: &[CandidateCard],
    deck: &DeckIndex,
    lemmas: &LemmaProvider,
    stopwords: &StopWords,
    options: &LintOptions,
) -> Vec<CardReport> {
    let detections = analyze_candidates(candidates, deck, lemmas);
    let mut self_duplicates = if options.skip_self_check {
        BTreeMap::new()
    } else {
        analyze_self_duplicates(candidates, lemmas)
    };

    detections
        .into_iter()
        .zip(candidates)
        .enumerate()
        .map(|(row, (detection, card))| {
            let tags = options.tag_schema.as_ref().map(|schema| {
                schema.analyze_card_tags(&card.front, &card.back, &card.tags, options.auto_tag)
            });
            let cloze = options
                .check_cloze
                .then(|| analyze_cloze_card(&card.front, stopwords));
            let context = options.check_context.then(|| classify_context(&card.front));
            let recommendation = options
                .recommend_cloze
                .then(|| recommend_cloze(&card.front, &card.tags, detection.warning_level));

            CardReport {
                self_duplicate: self_duplicates.remove(&row),
                detection,
                tags,
                cloze,
                context,
                recommendation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::NoteEntry;
    use crate::detect::WarningLevel;

    fn deck_and_provider() -> (DeckIndex, LemmaProvider) {
        let lemmas = LemmaProvider::new();
        let mut deck = DeckIndex::new();
        deck.add_note(
            NoteEntry::new("note1", "Basic", "λύω", "I loose"),
            Some(&lemmas),
        );
        (deck, lemmas)
    }

    #[test]
    fn test_default_options_attach_only_self_duplicates() {
        let (deck, lemmas) = deck_and_provider();
        let candidates = vec![
            CandidateCard::new("λύω", "I loose", ""),
            CandidateCard::new("λύω", "I release", ""),
        ];

        let reports = lint_candidates(
            &candidates,
            &deck,
            &lemmas,
            &StopWords::empty(),
            &LintOptions::default(),
        );

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].detection.warning_level, WarningLevel::High);
        assert!(reports[0].self_duplicate.is_some());
        assert!(reports[0].tags.is_none());
        assert!(reports[0].cloze.is_none());
        assert!(reports[0].context.is_none());
        assert!(reports[0].recommendation.is_none());
    }

    #[test]
    fn test_skip_self_check() {
        let (deck, lemmas) = deck_and_provider();
        let candidates = vec![
            CandidateCard::new("λύω", "I loose", ""),
            CandidateCard::new("λύω", "I release", ""),
        ];

        let options = LintOptions {
            skip_self_check: true,
            ..LintOptions::default()
        };
        let reports = lint_candidates(&candidates, &deck, &lemmas, &StopWords::empty(), &options);
        assert!(reports.iter().all(|r| r.self_duplicate.is_none()));
    }

    #[test]
    fn test_enabled_analyses_attach() {
        let (deck, lemmas) = deck_and_provider();
        let candidates = vec![CandidateCard::new(
            "ὁ ἄνθρωπος βαίνει πρὸς τὸν ἀγρόν",
            "the man walks to the field",
            "verb",
        )];

        let options = LintOptions {
            tag_schema: Some(TagSchema::from_parts(&["verb"], &[], vec![])),
            check_cloze: true,
            check_context: true,
            recommend_cloze: true,
            ..LintOptions::default()
        };
        let reports = lint_candidates(&candidates, &deck, &lemmas, &StopWords::empty(), &options);

        let report = &reports[0];
        assert_eq!(report.tags.as_ref().map(|t| t.kept.clone()), Some(vec!["verb".to_string()]));
        assert!(report.cloze.is_some());
        assert!(!report.cloze.as_ref().is_some_and(|c| c.is_cloze));
        assert!(report.context.is_some());
        assert!(report.recommendation.as_ref().is_some_and(|r| r.should_cloze));
    }

    #[test]
    fn test_recommendation_sees_duplicate_level() {
        let lemmas = LemmaProvider::new();
        let mut deck = DeckIndex::new();
        deck.add_note(
            NoteEntry::new("note1", "Basic", "ὁ ἄνθρωπος βαίνει πρὸς τὸν ἀγρόν", "x"),
            Some(&lemmas),
        );

        let candidates = vec![CandidateCard::new(
            "ὁ ἄνθρωπος βαίνει πρὸς τὸν ἀγρόν",
            "",
            "",
        )];
        let options = LintOptions {
            recommend_cloze: true,
            ..LintOptions::default()
        };
        let reports = lint_candidates(&candidates, &deck, &lemmas, &StopWords::empty(), &options);

        // Exact duplicate: detection is high and the recommendation declines.
        assert_eq!(reports[0].detection.warning_level, WarningLevel::High);
        let rec = reports[0].recommendation.as_ref().unwrap();
        assert!(!rec.should_cloze);
        assert_eq!(rec.reason, "exact_duplicate");
    }

    #[test]
    fn test_empty_batch() {
        let (deck, lemmas) = deck_and_provider();
        let reports = lint_candidates(
            &[],
            &deck,
            &lemmas,
            &StopWords::empty(),
            &LintOptions::default(),
        );
        assert!(reports.is_empty());
    }
}
