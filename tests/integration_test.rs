//! Integration tests for hoplite.
//!
//! Exercise the full pipeline: export parsing, index construction,
//! candidate ingestion, tiered detection, analyses, and report output.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use hoplite::analysis::TagSchema;
use hoplite::deck::{FieldMap, build_from_export, index_export};
use hoplite::detect::{CandidateCard, WarningLevel, analyze_candidates, analyze_deck_internal};
use hoplite::io::{COLUMNS, parse_candidates, render_summary, write_report, write_report_file};
use hoplite::lemma::{LemmaBackend, LemmaProvider};
use hoplite::lint::{LintOptions, lint_candidates};
use hoplite::stopwords::StopWords;
use hoplite::{Error, Result};

const EXPORT: &str = "\
#separator:tab\n\
#guid column:1\n\
#notetype column:2\n\
#deck column:3\n\
#tags column:6\n\
note1\tBasic\tUnified Greek\tλύω\tI loose\tverb\n\
note2\tBasic\tUnified Greek\tκαί\tand\tparticle\n\
note3\tBasic\tUnified Greek\tλέγω\tI say\tverb\n\
note4\tBasic\tUnified Greek\tἀγρός\tfield\tnoun\n";

const CANDIDATES: &str = "\
front,back,tags\n\
λύω,I loose,verb\n\
λύεις,you loose,verb\n\
πεδίον,field,noun\n\
νέος,new,adjective\n";

/// Lemma table covering the paradigm the fixtures use.
struct ParadigmBackend;

impl LemmaBackend for ParadigmBackend {
    fn lemmatize(&self, token: &str) -> Result<Option<String>> {
        Ok(match token {
            "λύω" | "λύεις" | "ἔλυσα" => Some("λύω".to_string()),
            _ => None,
        })
    }

    fn name(&self) -> &'static str {
        "paradigm"
    }
}

/// Backend that fails on every call.
struct BrokenBackend;

impl LemmaBackend for BrokenBackend {
    fn lemmatize(&self, _token: &str) -> Result<Option<String>> {
        Err(Error::OperationFailed {
            operation: "lemmatize".to_string(),
            cause: "model resources missing".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

fn provider() -> LemmaProvider {
    LemmaProvider::new().with_backend(Box::new(ParadigmBackend))
}

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("test message".to_string());
    let display = format!("{err}");
    assert!(display.contains("invalid input"));
    assert!(display.contains("test message"));

    let err = Error::OperationFailed {
        operation: "read".to_string(),
        cause: "file not found".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("read"));
    assert!(display.contains("file not found"));
}

#[test]
fn test_export_to_detection_tiers() {
    let lemmas = provider();
    let deck = index_export(EXPORT, &FieldMap::default(), Some(&lemmas));
    let candidates = parse_candidates(CANDIDATES).unwrap();

    let results = analyze_candidates(&candidates, &deck, &lemmas);
    assert_eq!(results.len(), 4);

    assert_eq!(results[0].warning_level, WarningLevel::High);
    assert_eq!(results[0].match_reason.as_str(), "exact-greek-match");
    assert!(results[0].matched_note_ids.contains("note1"));

    assert_eq!(results[1].warning_level, WarningLevel::Medium);
    assert_eq!(results[1].match_reason.as_str(), "lemma-match");

    assert_eq!(results[2].warning_level, WarningLevel::Low);
    assert_eq!(results[2].match_reason.as_str(), "english-gloss-match");
    assert!(results[2].matched_note_ids.contains("note4"));

    assert_eq!(results[3].warning_level, WarningLevel::None);
    assert_eq!(results[3].match_reason.as_str(), "no-match");
    assert_eq!(results[3].matched_note_ids, "");
}

#[test]
fn test_end_to_end_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let export_path = dir.path().join("export.txt");
    let report_path = dir.path().join("out").join("report.csv");
    std::fs::write(&export_path, EXPORT).unwrap();

    let lemmas = provider();
    let deck = build_from_export(&export_path, &FieldMap::default(), Some(&lemmas));
    assert_eq!(deck.len(), 4);

    let candidates = parse_candidates(CANDIDATES).unwrap();
    let reports = lint_candidates(
        &candidates,
        &deck,
        &lemmas,
        &StopWords::empty(),
        &LintOptions::default(),
    );

    write_report_file(&report_path, &reports).unwrap();

    let written = std::fs::read_to_string(&report_path).unwrap();
    let mut reader = csv::Reader::from_reader(written.as_bytes());
    assert_eq!(reader.headers().unwrap().len(), COLUMNS.len());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[0][5], "high");
    assert_eq!(&rows[1][5], "medium");
    assert_eq!(&rows[2][5], "low");
    assert_eq!(&rows[3][5], "none");
}

#[test]
fn test_broken_backend_never_escapes() {
    let lemmas = LemmaProvider::new().with_backend(Box::new(BrokenBackend));
    let deck = index_export(EXPORT, &FieldMap::default(), Some(&lemmas));
    let candidates = parse_candidates(CANDIDATES).unwrap();

    // Every candidate still produces a deterministic result.
    let results = analyze_candidates(&candidates, &deck, &lemmas);
    assert_eq!(results.len(), 4);

    // Exact and gloss tiers are untouched by lemma fallback.
    assert_eq!(results[0].warning_level, WarningLevel::High);
    assert_eq!(results[2].warning_level, WarningLevel::Low);

    // The lemma tier degrades: λύεις no longer reduces to λύω, but the
    // fallback self-lemma is still recorded.
    assert_eq!(results[1].lemma, "λυεισ");
    assert_eq!(lemmas.backend_name(), "fallback");
}

#[test]
fn test_empty_deck_is_valid_starting_state() {
    let lemmas = provider();
    let deck = build_from_export(
        std::path::Path::new("/nonexistent/export.txt"),
        &FieldMap::default(),
        Some(&lemmas),
    );
    assert!(deck.is_empty());

    let candidates = parse_candidates(CANDIDATES).unwrap();
    let results = analyze_candidates(&candidates, &deck, &lemmas);
    for result in &results {
        assert_eq!(result.warning_level, WarningLevel::None);
        assert_eq!(result.matched_note_ids, "");
    }
}

#[test]
fn test_deck_self_check_finds_planted_duplicate() {
    let export_with_dup = format!(
        "{EXPORT}note5\tBasic\tUnified Greek\tΛύω\tI loose again\tverb\n"
    );
    let lemmas = provider();
    let deck = index_export(&export_with_dup, &FieldMap::default(), Some(&lemmas));

    let duplicates = analyze_deck_internal(&deck, &lemmas);
    // note1 and note5 collide (case-insensitively); nobody reports itself.
    assert_eq!(duplicates.len(), 2);
    for dup in &duplicates {
        assert_eq!(dup.warning_level, WarningLevel::High);
        assert_eq!(dup.matched_note_ids.matches(',').count(), 0);
    }
}

#[test]
fn test_full_feature_lint_report() {
    let lemmas = provider();
    let deck = index_export(EXPORT, &FieldMap::default(), Some(&lemmas));
    let stopwords = StopWords::from_words(["ὁ", "καί", "πρός", "τόν"]);

    let candidates = vec![
        CandidateCard::new("ὁ ἄνθρωπος βαίνει πρὸς τὸν ἀγρόν", "the man walks to the field", "verb chapter3"),
        CandidateCard::new("ὁ ἄνθρωπος {{c1::βαίνει}} πρὸς τὸν ἀγρόν", "the man walks to the field", "verb"),
    ];

    let options = LintOptions {
        tag_schema: Some(TagSchema::from_parts(&["verb", "noun"], &["chapter3"], vec![])),
        check_cloze: true,
        check_context: true,
        recommend_cloze: true,
        auto_tag: false,
        skip_self_check: false,
    };
    let reports = lint_candidates(&candidates, &deck, &lemmas, &stopwords, &options);

    let first = &reports[0];
    let tag_analysis = first.tags.as_ref().unwrap();
    assert_eq!(tag_analysis.kept, vec!["verb"]);
    assert_eq!(tag_analysis.deleted, vec!["chapter3"]);
    assert!(first.context.as_ref().is_some_and(|c| c.token_count >= 5));
    assert!(first.recommendation.as_ref().unwrap().should_cloze);

    let second = &reports[1];
    let cloze = second.cloze.as_ref().unwrap();
    assert!(cloze.is_cloze);
    assert_eq!(cloze.cloze_tokens, 1);
    assert!(!second.recommendation.as_ref().unwrap().should_cloze);

    let summary = render_summary(&reports);
    assert!(summary.contains("Tag Hygiene Summary:"));
    assert!(summary.contains("Cloze Validation Summary:"));
    assert!(summary.contains("Context Analysis Summary:"));
    assert!(summary.contains("Cloze Recommendation Summary:"));
    assert!(summary.contains("Duplicate Detection Summary:"));

    let mut buffer = Vec::new();
    write_report(&mut buffer, &reports).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.lines().count() >= 3);
}

#[test]
fn test_lemma_cache_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache").join("lemma_cache.json");

    // First run: backend resolves and the cache is saved.
    let lemmas = LemmaProvider::new()
        .with_backend(Box::new(ParadigmBackend))
        .with_cache_path(&cache_path);
    let deck = index_export(EXPORT, &FieldMap::default(), Some(&lemmas));
    assert!(!deck.is_empty());
    // Resolve the inflected form too, so the cache covers it.
    assert_eq!(lemmas.lemmatize_token("λύεις"), "λυω");
    lemmas.save_cache();
    assert!(cache_path.exists());

    // Second run: no backend, cache alone reproduces the lemma tier.
    let cached = LemmaProvider::new().with_cache_path(&cache_path);
    let deck2 = index_export(EXPORT, &FieldMap::default(), Some(&cached));
    let results = analyze_candidates(
        &[CandidateCard::new("λύεις", "you loose", "")],
        &deck2,
        &cached,
    );
    assert_eq!(results[0].warning_level, WarningLevel::Medium);
}
