//! # Hoplite
//!
//! Duplicate-detection linter for Ancient Greek Anki vocabulary decks.
//!
//! Hoplite ingests candidate cards, normalizes their Greek text,
//! lemmatizes it through a pluggable backend, and flags duplicates
//! against a reference deck at three severities: exact string (high),
//! same lemma (medium), and same English gloss (low). Optional per-card
//! analyses cover tag hygiene, cloze quality, context richness, and
//! cloze conversion recommendations.
//!
//! ## Example
//!
//! ```rust
//! use hoplite::deck::{DeckIndex, NoteEntry};
//! use hoplite::detect::{CandidateCard, WarningLevel, analyze_candidates};
//! use hoplite::lemma::LemmaProvider;
//!
//! let lemmas = LemmaProvider::new();
//! let mut deck = DeckIndex::new();
//! deck.add_note(NoteEntry::new("note1", "Basic", "λύω", "I loose"), Some(&lemmas));
//!
//! let results = analyze_candidates(
//!     &[CandidateCard::new("Λύω", "I loose", "")],
//!     &deck,
//!     &lemmas,
//! );
//! assert_eq!(results[0].warning_level, WarningLevel::High);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod analysis;
pub mod config;
pub mod deck;
pub mod detect;
pub mod io;
pub mod lemma;
pub mod lint;
pub mod normalize;
pub mod stopwords;

// Re-exports for convenience
pub use config::{BackendConfig, BackendKind, HopliteConfig};
pub use deck::{DeckIndex, FieldMap, NoteEntry, NoteId};
pub use detect::{CandidateCard, DetectionResult, MatchReason, SelfDuplicate, WarningLevel};
pub use lemma::{LemmaBackend, LemmaProvider};
pub use lint::{CardReport, LintOptions, lint_candidates};
pub use stopwords::StopWords;

/// Error type for hoplite operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed JSON configs, invalid auto-tag regexes, missing candidate columns |
/// | `OperationFailed` | Filesystem I/O errors, CSV serialization failures, backend transport errors |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A field map, tag schema, overrides, or lexicon file holds malformed JSON
    /// - An auto-tag rule's regex fails to compile
    /// - A candidate file is missing a required column
    /// - The TOML configuration fails to parse
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O fails outside the degrade-gracefully paths
    /// - Report serialization fails
    /// - The lemmatization backend reports a transport or decode error
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for hoplite operations.
pub type Result<T> = std::result::Result<T, Error>;
