//! Optional per-card analyses layered on top of duplicate detection.
//!
//! Each analysis produces an independent record attached to the base
//! detection result; disabling a feature simply leaves its attachment
//! absent.

pub mod cloze;
pub mod context;
pub mod recommend;
pub mod tags;

pub use cloze::{ClozeAnalysis, ClozeQuality, analyze_cloze_card};
pub use context::{ContextAnalysis, ContextLevel, ContextRecommendation, classify_context};
pub use recommend::{ClozeRecommendation, ClozeType, recommend_cloze};
pub use tags::{TagAnalysis, TagSchema, format_tags, parse_tags};
