//! Tier A: template matching against the anchor catalog.

use std::collections::{BTreeMap, BTreeSet};

use data::{Category, CategorySchema};

use super::{AnchorCatalog, AnchorKey, AnchorSearch};
use crate::{DetectedTarget, DisplayPreference, ExpandedCategory, RawFrame, Rect, Signals};

/// Bonus an expanded header gets over a collapsed one when both match a category.
const EXPANDED_HEADER_BONUS: f32 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorMatch {
	pub rect: Rect,
	pub confidence: f32,
	pub hits: usize,
}

impl AnchorMatch {
	fn target(&self) -> DetectedTarget {
		DetectedTarget {
			rect: self.rect,
			confidence: self.confidence,
		}
	}
}

/// More repeated hits raise confidence, capped.
pub fn match_confidence(expected: f32, hits: usize) -> f32 {
	(expected + (hits as f32 * 0.02).min(0.08)).min(1.0)
}

/// State of a two-sided control: only one side matched wins outright, otherwise
/// the more confident one; ties go to the "on" side.
pub fn resolve_pair(on: Option<&AnchorMatch>, off: Option<&AnchorMatch>) -> Option<bool> {
	match (on, off) {
		(Some(_), None) => Some(true),
		(None, Some(_)) => Some(false),
		(Some(on), Some(off)) => Some(on.confidence >= off.confidence),
		(None, None) => None,
	}
}

fn best_of_pair<'a>(on: Option<&'a AnchorMatch>, off: Option<&'a AnchorMatch>) -> Option<&'a AnchorMatch> {
	match (on, off) {
		(Some(on), Some(off)) => Some(if on.confidence >= off.confidence { on } else { off }),
		(on, off) => on.or(off),
	}
}

/// Pick the most confident expanded category.
///
/// Candidates are per category. A runner-up within 0.05 costs 0.2 confidence,
/// any other runner-up 0.1; the result stays within `[0.45, 0.95]`.
pub fn resolve_expanded(candidates: &BTreeMap<Category, f32>) -> Option<ExpandedCategory> {
	let mut ranked: Vec<(Category, f32)> = candidates.iter().map(|(c, v)| (*c, *v)).collect();
	ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
	let (category, top) = *ranked.first()?;
	let penalty = match ranked.get(1) {
		Some((_, second)) if top - second < 0.05 => 0.2,
		Some(_) => 0.1,
		None => 0.0,
	};
	Some(ExpandedCategory {
		category: Some(category),
		confidence: Some((top - penalty).clamp(0.45, 0.95)),
	})
}

/// What Tier A found in one frame.
#[derive(Debug, Clone, Default)]
pub struct TemplateEvidence {
	pub signals: Signals,
	/// Number of catalog entries with at least one hit.
	pub matched: usize,
}

pub fn detect_anchors(
	frame: &RawFrame,
	catalog: &AnchorCatalog,
	search: &dyn AnchorSearch,
	schema: &CategorySchema,
) -> TemplateEvidence {
	let mut matches: BTreeMap<AnchorKey, AnchorMatch> = BTreeMap::new();
	let mut names = Vec::new();
	let mut generic_preferred = false;

	let mut headers: BTreeMap<Category, (Rect, f32)> = BTreeMap::new();
	let mut expanded: BTreeMap<Category, f32> = BTreeMap::new();
	let mut rail_parts = Vec::new();

	for anchor in catalog.iter() {
		let hits = search.find(frame, anchor);
		let Some(first) = hits.first() else {
			continue;
		};
		let key = anchor.definition.key;
		let found = AnchorMatch {
			rect: Rect::new(
				first.x as i32,
				first.y as i32,
				anchor.template.width(),
				anchor.template.height(),
			),
			confidence: match_confidence(anchor.definition.expected_confidence, hits.len()),
			hits: hits.len(),
		};

		if let Some(category) = key.category() {
			rail_parts.push(found.rect);
			let weighted = found.confidence + if key.is_expanded_header() { EXPANDED_HEADER_BONUS } else { 0.0 };
			let best = headers.get(&category).map_or(f32::MIN, |(_, c)| *c);
			if weighted >= best {
				headers.insert(category, (found.rect, weighted));
			}
			if key.is_expanded_header() {
				let entry = expanded.entry(category).or_insert(weighted);
				*entry = entry.max(weighted);
				generic_preferred |= anchor.definition.prefers_generic_highlight();
			}
		} else if matches!(key, AnchorKey::AllCategoriesClosed { .. }) {
			rail_parts.push(found.rect);
		}

		names.push(key.to_string());
		matches.insert(key, found);
	}

	let get = |key: AnchorKey| matches.get(&key);
	let all_closed = get(AnchorKey::AllCategoriesClosed { variant: 1 }).is_some()
		|| get(AnchorKey::AllCategoriesClosed { variant: 2 }).is_some();

	let mut visible: BTreeSet<Category> = headers.keys().copied().collect();
	if all_closed {
		visible.extend(schema.names());
	}

	let expanded_category = if all_closed {
		Some(ExpandedCategory::NONE)
	} else {
		resolve_expanded(&expanded)
	};

	let top_on = get(AnchorKey::AchievementsTab { selected: true });
	let top_off = get(AnchorKey::AchievementsTab { selected: false });
	let sub_on = get(AnchorKey::AchievementsSubtab { selected: true });
	let sub_off = get(AnchorKey::AchievementsSubtab { selected: false });
	let pref_state = |preference: DisplayPreference| {
		let on = get(AnchorKey::Preference { preference, checked: true });
		let off = get(AnchorKey::Preference { preference, checked: false });
		(resolve_pair(on, off), best_of_pair(on, off).map(AnchorMatch::target))
	};
	let (show_locked, show_locked_target) = pref_state(DisplayPreference::ShowLocked);
	let (show_completed, show_completed_target) = pref_state(DisplayPreference::ShowCompleted);
	let (list_mode, list_mode_target) = pref_state(DisplayPreference::ListMode);

	let signals = Signals {
		has_options_menu: get(AnchorKey::OptionsMenu).map(|_| true),
		has_hero_window: get(AnchorKey::HeroWindow).map(|_| true),
		matched_anchors: (!names.is_empty()).then(|| names.clone()),
		options_menu_target: get(AnchorKey::OptionsMenu).map(AnchorMatch::target),
		hero_button_target: get(AnchorKey::HeroButton).map(AnchorMatch::target),
		hero_window_target: get(AnchorKey::HeroWindow).map(AnchorMatch::target),
		top_tab_target: best_of_pair(top_on, top_off).map(AnchorMatch::target),
		subtab_target: best_of_pair(sub_on, sub_off).map(AnchorMatch::target),
		top_tab_selected: resolve_pair(top_on, top_off),
		subtab_selected: resolve_pair(sub_on, sub_off),
		show_locked,
		show_completed,
		list_mode,
		show_locked_target,
		show_completed_target,
		list_mode_target,
		category_rail: Rect::union(rail_parts),
		category_headers: (!headers.is_empty()).then(|| headers.iter().map(|(c, (r, _))| (*c, *r)).collect()),
		expanded_marker: get(AnchorKey::ExpandedCategory)
			.or_else(|| get(AnchorKey::ExpandedCategoryColor))
			.map(|m| m.rect),
		prefer_generic_highlight: generic_preferred.then_some(true),
		expanded_category,
		visible_categories: (!visible.is_empty()).then_some(visible),
		telemetry: Default::default(),
	};

	TemplateEvidence {
		matched: names.len(),
		signals,
	}
}
