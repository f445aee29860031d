//! Candidate card ingestion.
//!
//! Reads delimited text with required columns `front`, `back`, `tags`
//! (case-insensitive header match). The delimiter is auto-detected from
//! the header line among tab, semicolon, and comma; quoting is handled
//! by the CSV reader.

use crate::detect::CandidateCard;
use crate::{Error, Result};
use std::path::Path;

/// Column positions of the required fields.
struct ColumnMap {
    front: usize,
    back: usize,
    tags: usize,
}

impl ColumnMap {
    /// Resolves required columns from the header record.
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let mut front = None;
        let mut back = None;
        let mut tags = None;

        for (i, header) in headers.iter().enumerate() {
            match header.trim().to_lowercase().as_str() {
                "front" => front = Some(i),
                "back" => back = Some(i),
                "tags" => tags = Some(i),
                _ => {}, // Ignore unknown columns
            }
        }

        let missing: Vec<&str> = [("front", front), ("back", back), ("tags", tags)]
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            front: front.unwrap_or(0),
            back: back.unwrap_or(0),
            tags: tags.unwrap_or(0),
        })
    }
}

/// Picks the delimiter from the header line.
///
/// Tab is the most distinctive, then semicolon; comma is the default.
fn detect_delimiter(first_line: &str) -> u8 {
    if first_line.contains('\t') {
        b'\t'
    } else if first_line.contains(';') {
        b';'
    } else {
        b','
    }
}

/// Reads candidate cards from a file.
///
/// # Errors
///
/// Returns `Error::OperationFailed` when the file cannot be read and
/// `Error::InvalidInput` when a required column is missing. Malformed
/// rows beyond that are tolerated: short rows yield empty fields.
pub fn read_candidates(path: &Path) -> Result<Vec<CandidateCard>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_candidates".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    parse_candidates(&contents)
}

/// Parses candidate cards from delimited text.
///
/// # Errors
///
/// Returns `Error::InvalidInput` when a required column is missing, or
/// `Error::OperationFailed` when the reader chokes on the input.
pub fn parse_candidates(contents: &str) -> Result<Vec<CandidateCard>> {
    let delimiter = detect_delimiter(contents.lines().next().unwrap_or(""));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::OperationFailed {
            operation: "read_candidate_headers".to_string(),
            cause: e.to_string(),
        })?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut candidates = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::OperationFailed {
            operation: "read_candidate_row".to_string(),
            cause: e.to_string(),
        })?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        candidates.push(CandidateCard {
            front: field(columns.front),
            back: field(columns.back),
            tags: field(columns.tags),
        });
    }

    tracing::debug!(count = candidates.len(), "read candidate batch");
    Ok(candidates)
}
