//! Lint report serialization and console summary.
//!
//! Every report field serializes to a CSV column. Booleans flatten to
//! `true`/`false`; attachments that did not run leave their columns
//! empty, so the column set is stable regardless of enabled features.

use crate::analysis::format_tags;
use crate::detect::WarningLevel;
use crate::lint::CardReport;
use crate::{Error, Result};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Report column headers, in output order.
pub const COLUMNS: [&str; 33] = [
    "front",
    "back",
    "tags",
    "normalized_greek",
    "lemma",
    "warning_level",
    "match_reason",
    "matched_note_ids",
    "self_duplicate_level",
    "self_duplicate_reason",
    "self_duplicate_rows",
    "tags_kept",
    "tags_deleted",
    "tags_unknown",
    "tags_auto_added",
    "tags_final",
    "tags_need_review",
    "cloze_quality",
    "cloze_total_tokens",
    "cloze_context_tokens",
    "cloze_deletion_ratio",
    "cloze_content_density",
    "cloze_reasons",
    "context_level",
    "context_token_count",
    "context_recommendation",
    "cloze_recommended",
    "cloze_type",
    "cloze_suggested_deletion",
    "cloze_suggested_front",
    "cloze_hint",
    "cloze_confidence",
    "cloze_recommendation_reason",
];

fn bool_str(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Flattens one report into its CSV row.
#[must_use]
pub fn report_row(report: &CardReport) -> Vec<String> {
    let d = &report.detection;
    let mut row = vec![
        d.front.clone(),
        d.back.clone(),
        d.tags.clone(),
        d.normalized_greek.clone(),
        d.lemma.clone(),
        d.warning_level.to_string(),
        d.match_reason.to_string(),
        d.matched_note_ids.clone(),
    ];

    match &report.self_duplicate {
        Some(s) => row.extend([s.level.to_string(), s.reason.to_string(), s.rows.clone()]),
        None => row.extend([String::new(), String::new(), String::new()]),
    }

    match &report.tags {
        Some(t) => row.extend([
            format_tags(&t.kept),
            format_tags(&t.deleted),
            format_tags(&t.unknown),
            format_tags(&t.auto_added),
            format_tags(&t.final_tags),
            bool_str(t.needs_review),
        ]),
        None => row.extend(std::iter::repeat_n(String::new(), 6)),
    }

    match &report.cloze {
        Some(c) => row.extend([
            c.quality.to_string(),
            c.total_tokens.to_string(),
            c.context_tokens.to_string(),
            format!("{:.3}", c.deletion_ratio),
            format!("{:.3}", c.content_word_density),
            c.reasons.join(";"),
        ]),
        None => row.extend(std::iter::repeat_n(String::new(), 6)),
    }

    match &report.context {
        Some(c) => row.extend([
            c.level.as_str().to_string(),
            c.token_count.to_string(),
            c.recommendation.as_str().to_string(),
        ]),
        None => row.extend(std::iter::repeat_n(String::new(), 3)),
    }

    match &report.recommendation {
        Some(r) => row.extend([
            bool_str(r.should_cloze),
            r.cloze_type.as_str().to_string(),
            r.suggested_deletion.clone(),
            r.suggested_front.clone(),
            r.hint.clone(),
            format!("{:.2}", r.confidence),
            r.reason.clone(),
        ]),
        None => row.extend(std::iter::repeat_n(String::new(), 7)),
    }

    row
}

/// Writes the CSV report to any writer.
///
/// # Errors
///
/// Returns `Error::OperationFailed` on serialization or I/O failure.
pub fn write_report<W: Write>(writer: W, reports: &[CardReport]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let io_err = |e: csv::Error| Error::OperationFailed {
        operation: "write_report".to_string(),
        cause: e.to_string(),
    };

    csv_writer.write_record(COLUMNS).map_err(io_err)?;
    for report in reports {
        csv_writer.write_record(report_row(report)).map_err(io_err)?;
    }
    csv_writer.flush().map_err(|e| Error::OperationFailed {
        operation: "flush_report".to_string(),
        cause: e.to_string(),
    })
}

/// Writes the CSV report to a file, creating parent directories.
///
/// # Errors
///
/// Returns `Error::OperationFailed` on I/O failure.
pub fn write_report_file(path: &Path, reports: &[CardReport]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_report_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }
    let file = std::fs::File::create(path).map_err(|e| Error::OperationFailed {
        operation: "create_report_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    write_report(file, reports)
}

fn count_levels(levels: impl Iterator<Item = WarningLevel>) -> [(WarningLevel, usize); 4] {
    let mut counts = [
        (WarningLevel::High, 0),
        (WarningLevel::Medium, 0),
        (WarningLevel::Low, 0),
        (WarningLevel::None, 0),
    ];
    for level in levels {
        for entry in &mut counts {
            if entry.0 == level {
                entry.1 += 1;
            }
        }
    }
    counts
}

/// Renders the console summary for a batch of reports.
///
/// Feature sections appear only when at least one report carries the
/// corresponding attachment.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn render_summary(reports: &[CardReport]) -> String {
    let mut out = String::new();

    if reports.iter().any(|r| r.tags.is_some()) {
        let mut total = 0;
        let mut kept = 0;
        let mut deleted = 0;
        let mut unknown = 0;
        let mut auto_added = 0;
        let mut need_review = 0;
        for t in reports.iter().filter_map(|r| r.tags.as_ref()) {
            total += crate::analysis::parse_tags(&t.original_tags).len();
            kept += t.kept.len();
            deleted += t.deleted.len();
            unknown += t.unknown.len();
            auto_added += t.auto_added.len();
            if t.needs_review {
                need_review += 1;
            }
        }
        let _ = writeln!(out, "Tag Hygiene Summary:");
        let _ = writeln!(out, "  Total tags processed: {total}");
        let _ = writeln!(out, "  Kept (allowed):       {kept}");
        let _ = writeln!(out, "  Deleted (blocked):    {deleted}");
        let _ = writeln!(out, "  Unknown (review):     {unknown}");
        let _ = writeln!(out, "  Auto-added:           {auto_added}");
        let _ = writeln!(out, "  Cards needing review: {need_review}");
        let _ = writeln!(out);
    }

    if reports.iter().any(|r| r.cloze.is_some()) {
        let analyses: Vec<_> = reports.iter().filter_map(|r| r.cloze.as_ref()).collect();
        let cloze_cards = analyses.iter().filter(|c| c.is_cloze).count();
        let _ = writeln!(out, "Cloze Validation Summary:");
        let _ = writeln!(out, "  Total cloze cards:     {cloze_cards}");
        let _ = writeln!(
            out,
            "  Total non-cloze cards: {}",
            analyses.len() - cloze_cards
        );
        if cloze_cards > 0 {
            let _ = writeln!(out, "  Quality breakdown:");
            for quality in ["excellent", "good", "weak", "poor"] {
                let count = analyses
                    .iter()
                    .filter(|c| c.quality.as_str() == quality)
                    .count();
                let _ = writeln!(out, "    {quality:>9}: {count:>3}");
            }
        }
        let _ = writeln!(out);
    }

    if reports.iter().any(|r| r.context.is_some()) {
        let analyses: Vec<_> = reports.iter().filter_map(|r| r.context.as_ref()).collect();
        let level_count = |level: &str| {
            analyses
                .iter()
                .filter(|c| c.level.as_str() == level)
                .count()
        };
        let rec_count = |rec: &str| {
            analyses
                .iter()
                .filter(|c| c.recommendation.as_str() == rec)
                .count()
        };
        let _ = writeln!(out, "Context Analysis Summary:");
        let _ = writeln!(out, "  Context levels:");
        let _ = writeln!(out, "    Rich context:       {}", level_count("rich_context"));
        let _ = writeln!(out, "    Minimal context:    {}", level_count("minimal_context"));
        let _ = writeln!(out, "    Phrase fragment:    {}", level_count("phrase_fragment"));
        let _ = writeln!(out, "    Isolated:           {}", level_count("isolated"));
        let _ = writeln!(out, "  Recommendations:");
        let _ = writeln!(out, "    Good:               {}", rec_count("good"));
        let _ = writeln!(out, "    Consider enhancing: {}", rec_count("consider_enhancing"));
        let _ = writeln!(out, "    Needs context:      {}", rec_count("needs_context"));
        let _ = writeln!(out);
    }

    if reports.iter().any(|r| r.recommendation.is_some()) {
        let recs: Vec<_> = reports
            .iter()
            .filter_map(|r| r.recommendation.as_ref())
            .collect();
        let recommended = recs.iter().filter(|r| r.should_cloze).count();
        let high = recs.iter().filter(|r| r.confidence >= 0.75).count();
        let medium = recs
            .iter()
            .filter(|r| r.confidence >= 0.5 && r.confidence < 0.75)
            .count();
        let low = recs
            .iter()
            .filter(|r| r.confidence >= 0.3 && r.confidence < 0.5)
            .count();
        let _ = writeln!(out, "Cloze Recommendation Summary:");
        let _ = writeln!(out, "  Total cards analyzed:       {}", reports.len());
        let _ = writeln!(out, "  Recommended for cloze:      {recommended}");
        let _ = writeln!(out, "    High confidence (>=0.75):  {high}");
        let _ = writeln!(out, "    Med confidence (0.5-0.75): {medium}");
        let _ = writeln!(out, "    Low confidence (0.3-0.5):  {low}");
        let _ = writeln!(out);
    }

    let self_dup_total = reports.iter().filter(|r| r.self_duplicate.is_some()).count();
    if self_dup_total > 0 {
        let _ = writeln!(out, "Self-Duplicate Detection Summary (within candidates):");
        let levels = count_levels(
            reports
                .iter()
                .filter_map(|r| r.self_duplicate.as_ref())
                .map(|s| s.level),
        );
        for (level, count) in levels {
            if level != WarningLevel::None && count > 0 {
                let _ = writeln!(out, "  {:>6}: {count}", level.as_str());
            }
        }
        let _ = writeln!(out, "  total : {self_dup_total}");
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Duplicate Detection Summary:");
    let levels = count_levels(reports.iter().map(|r| r.detection.warning_level));
    for (level, count) in levels {
        let _ = writeln!(out, "  {:>6}: {count}", level.as_str());
    }
    let _ = writeln!(out, "  total : {}", reports.len());

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DetectionResult, MatchReason, SelfDuplicate};

    fn base_report(level: WarningLevel, reason: MatchReason) -> CardReport {
        CardReport {
            detection: DetectionResult {
                front: "λύω".to_string(),
                back: "I loose".to_string(),
                tags: "verb".to_string(),
                normalized_greek: "λυω".to_string(),
                lemma: "λυω".to_string(),
                warning_level: level,
                match_reason: reason,
                matched_note_ids: "note1".to_string(),
            },
            self_duplicate: None,
            tags: None,
            cloze: None,
            context: None,
            recommendation: None,
        }
    }

    #[test]
    fn test_row_has_every_column() {
        let report = base_report(WarningLevel::High, MatchReason::ExactGreekMatch);
        assert_eq!(report_row(&report).len(), COLUMNS.len());
    }

    #[test]
    fn test_absent_attachments_serialize_empty() {
        let report = base_report(WarningLevel::None, MatchReason::NoMatch);
        let row = report_row(&report);
        // Everything past the base detection columns is empty.
        assert!(row[8..].iter().all(String::is_empty));
    }

    #[test]
    fn test_self_duplicate_columns() {
        let mut report = base_report(WarningLevel::None, MatchReason::NoMatch);
        report.self_duplicate = Some(SelfDuplicate {
            level: WarningLevel::High,
            reason: MatchReason::ExactGreekMatch,
            rows: "2,5".to_string(),
        });
        let row = report_row(&report);
        assert_eq!(row[8], "high");
        assert_eq!(row[9], "exact-greek-match");
        assert_eq!(row[10], "2,5");
    }

    #[test]
    fn test_csv_output_parses_back() {
        let reports = vec![
            base_report(WarningLevel::High, MatchReason::ExactGreekMatch),
            base_report(WarningLevel::None, MatchReason::NoMatch),
        ];
        let mut buffer = Vec::new();
        write_report(&mut buffer, &reports).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        assert_eq!(reader.headers().unwrap().len(), COLUMNS.len());
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn test_summary_counts_levels() {
        let reports = vec![
            base_report(WarningLevel::High, MatchReason::ExactGreekMatch),
            base_report(WarningLevel::High, MatchReason::ExactGreekMatch),
            base_report(WarningLevel::None, MatchReason::NoMatch),
        ];
        let summary = render_summary(&reports);
        assert!(summary.contains("Duplicate Detection Summary:"));
        assert!(summary.contains("high: 2"));
        assert!(summary.contains("none: 1"));
        assert!(summary.contains("total : 3"));
        // No feature attachments, no feature sections.
        assert!(!summary.contains("Tag Hygiene"));
        assert!(!summary.contains("Cloze Validation"));
    }

    #[test]
    fn test_summary_includes_self_duplicates_when_present() {
        let mut report = base_report(WarningLevel::None, MatchReason::NoMatch);
        report.self_duplicate = Some(SelfDuplicate {
            level: WarningLevel::Medium,
            reason: MatchReason::LemmaMatch,
            rows: "3".to_string(),
        });
        let summary = render_summary(&[report]);
        assert!(summary.contains("Self-Duplicate Detection Summary"));
        assert!(summary.contains("medium: 1"));
    }
}
