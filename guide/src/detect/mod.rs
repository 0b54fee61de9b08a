//! Target detectors: template matching (Tier A) and the text fallback (Tier B).

mod anchors;
pub use anchors::{AnchorMatch, TemplateEvidence, detect_anchors, match_confidence, resolve_expanded, resolve_pair};
mod catalog;
pub use catalog::{AnchorCatalog, AnchorDefinition, AnchorKey, AnchorRole, CategoryState, LoadedAnchor, definitions};
mod lexicon;
pub use lexicon::{LEXICON, detect_text, lexicon_hits, term_similarity};
mod search;
pub use search::{AnchorSearch, JsonHitSearch, PixelSearch, parse_hit_list};
pub mod text;
