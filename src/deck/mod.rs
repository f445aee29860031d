//! Reference deck: export parsing and lookup index.

mod export;
mod index;

pub use export::{FieldDefaults, FieldMap, FieldOverride, build_from_export, clean_field_text, index_export};
pub use index::{DeckIndex, NoteEntry, NoteId, gloss_key};
