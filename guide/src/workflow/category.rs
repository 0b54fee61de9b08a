//! Category normalization: all categories visible, none expanded.

use std::collections::BTreeSet;

use data::{Category, CategorySchema};

use crate::instructions::{self, HighlightMode};
use crate::{FrameSnapshot, GuideInstruction, Rect};

/// Confidence from which the expanded category's own header is trusted as a target.
const HEADER_HIGHLIGHT_CONFIDENCE: f32 = 0.7;
const SIGNAL_DEFAULT_CONFIDENCE: f32 = 0.85;
const ORDER_CONFIDENCE: f32 = 0.74;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RailState {
	pub visible: BTreeSet<Category>,
	pub rail: Option<Rect>,
}

impl RailState {
	pub fn from_snapshot(snapshot: &FrameSnapshot) -> Self {
		Self {
			visible: snapshot.signals.visible_categories.clone().unwrap_or_default(),
			rail: snapshot.signals.category_rail,
		}
	}

	/// Every schema category is on screen.
	pub fn shows_all(&self, schema: &CategorySchema) -> bool {
		schema.names().filter(|c| self.visible.contains(c)).count() == schema.len()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceSource {
	Signal,
	Order,
	Text,
	None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandedInference {
	pub category: Option<Category>,
	pub confidence: f32,
	pub source: InferenceSource,
}

impl ExpandedInference {
	const NONE: Self = Self {
		category: None,
		confidence: 0.0,
		source: InferenceSource::None,
	};
}

/// The category just above the top-most visible header is presumed open,
/// since its sections push everything below it down.
fn infer_from_order(snapshot: &FrameSnapshot) -> Option<ExpandedInference> {
	let visible = snapshot.signals.visible_categories.as_ref()?;
	if visible.is_empty() || visible.len() >= Category::ALL.len() {
		return None;
	}
	let headers = snapshot.signals.category_headers.as_ref()?;
	let (_, top) = visible
		.iter()
		.filter_map(|c| headers.get(c).map(|r| (r.y, *c)))
		.min()?;

	let index = Category::ALL.iter().position(|c| *c == top)?;
	Category::ALL[..index]
		.iter()
		.rev()
		.find(|c| c.is_expandable())
		.map(|c| ExpandedInference {
			category: Some(*c),
			confidence: ORDER_CONFIDENCE,
			source: InferenceSource::Order,
		})
}

/// An open category lists its subcategories; two or more of them on screen point to it.
fn infer_from_subcategories(snapshot: &FrameSnapshot, schema: &CategorySchema) -> ExpandedInference {
	let texts: Vec<String> = snapshot.tokens.iter().map(|t| t.text.to_lowercase()).collect();
	let mut best: Option<(Category, usize)> = None;
	for entry in schema.categories.iter().filter(|e| e.name.is_expandable()) {
		let hits = entry
			.subcategories
			.iter()
			.map(|s| s.to_lowercase())
			.filter(|s| texts.iter().any(|t| t.contains(s.as_str())))
			.count();
		if hits > best.map_or(0, |(_, h)| h) {
			best = Some((entry.name, hits));
		}
	}

	match best {
		Some((category, hits)) if hits >= 2 => ExpandedInference {
			category: Some(category),
			confidence: (0.55 + hits as f32 * 0.04).min(0.69),
			source: InferenceSource::Text,
		},
		_ => ExpandedInference::NONE,
	}
}

/// Which category currently shows its sections.
///
/// Fused signal first (a known "none" is final), then the ordering rule, then
/// subcategory text.
pub fn infer_expanded_category(snapshot: &FrameSnapshot, schema: &CategorySchema) -> ExpandedInference {
	if let Some(direct) = snapshot.signals.expanded_category {
		return match direct.category {
			Some(category) if category.is_expandable() => ExpandedInference {
				category: Some(category),
				confidence: direct.confidence.unwrap_or(SIGNAL_DEFAULT_CONFIDENCE),
				source: InferenceSource::Signal,
			},
			_ => ExpandedInference::NONE,
		};
	}

	infer_from_order(snapshot).unwrap_or_else(|| infer_from_subcategories(snapshot, schema))
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeStep {
	pub ready: bool,
	pub expanded: Option<Category>,
	pub mode: Option<HighlightMode>,
	pub instruction: GuideInstruction,
}

pub fn normalize_category_layout(snapshot: &FrameSnapshot, schema: &CategorySchema) -> NormalizeStep {
	let rail = RailState::from_snapshot(snapshot);
	let inference = infer_expanded_category(snapshot, schema);

	let Some(category) = inference.category else {
		if rail.shows_all(schema) {
			return NormalizeStep {
				ready: true,
				expanded: None,
				mode: None,
				instruction: instructions::ready_for_guided_scan(),
			};
		}
		return NormalizeStep {
			ready: false,
			expanded: None,
			mode: Some(HighlightMode::Rail),
			instruction: instructions::normalize_category_layout(HighlightMode::Rail, None, rail.rail),
		};
	};

	let signals = &snapshot.signals;
	let header = signals.category_headers.as_ref().and_then(|h| h.get(&category).copied());
	let forced_generic = signals.prefer_generic_highlight == Some(true);
	let confident = inference.confidence >= HEADER_HIGHLIGHT_CONFIDENCE;

	let (mode, highlight) = match (header, signals.expanded_marker) {
		(Some(header), _) if confident && !forced_generic => (HighlightMode::Header, Some(header)),
		(_, Some(marker)) => (HighlightMode::Scrollbar, Some(marker)),
		_ => (HighlightMode::Rail, rail.rail),
	};

	NormalizeStep {
		ready: false,
		expanded: Some(category),
		mode: Some(mode),
		instruction: instructions::normalize_category_layout(mode, Some(category), highlight),
	}
}
