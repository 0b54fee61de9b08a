//! Tier B: constrained text fallback.
//!
//! A closed lexicon of interface terms is fuzzily matched against every
//! recognized fragment. Booleans are only ever derived from combinations of
//! several terms, and only positive evidence is reported.

use std::collections::{BTreeMap, BTreeSet};

use data::{Category, CategorySchema};

use super::text::{bounding_rect, normalize_token, normalized_texts, token_matches};
use crate::{DetectedTarget, Rect, Signals, Token};

pub const LEXICON: [&str; 25] = [
	"options",
	"menu",
	"settings",
	"interface",
	"graphics",
	"audio",
	"controls",
	"gameplay",
	"display",
	"hero",
	"summary",
	"skills",
	"loadout",
	"achievements",
	"show",
	"completed",
	"locked",
	"select",
	"category",
	"combat",
	"lore",
	"exploration",
	"activities",
	"completionist",
	"feats",
];

const CONTAINED_SCORE: f32 = 0.95;
const MIN_SIMILARITY: f32 = 0.58;
const MIN_HIT: f32 = 0.65;
/// Terms feeding a composite must be at least this sure.
const MIN_COMPOSITE: f32 = 0.7;
/// Confidence of a single-fragment target whose recognizer reported none.
const TOKEN_TARGET_CONFIDENCE: f32 = 0.7;

/// Similarity of one normalized fragment to one term; zero when rejected.
pub fn term_similarity(token: &str, term: &str) -> f32 {
	if token.is_empty() || term.is_empty() {
		return 0.0;
	}
	if token.contains(term) {
		return CONTAINED_SCORE;
	}
	let max_len = token.chars().count().max(term.chars().count());
	let similarity = 1.0 - levenshtein::levenshtein(token, term) as f32 / max_len as f32;
	if similarity < MIN_SIMILARITY { 0.0 } else { similarity }
}

/// Best score per lexicon term over all fragments, kept when at least 0.65.
pub fn lexicon_hits(tokens: &[Token]) -> BTreeMap<&'static str, f32> {
	let normalized = normalized_texts(tokens);
	let mut hits = BTreeMap::new();
	for term in LEXICON {
		let mut best = 0.0f32;
		for token in &normalized {
			best = best.max(term_similarity(token, term));
			if best >= CONTAINED_SCORE {
				break;
			}
		}
		if best >= MIN_HIT {
			hits.insert(term, (best * 1000.0).round() / 1000.0);
		}
	}
	hits
}

struct Hits(BTreeMap<&'static str, f32>);

impl Hits {
	fn has(&self, term: &str) -> bool {
		self.0.get(term).is_some_and(|c| *c >= MIN_COMPOSITE)
	}

	fn any(&self, terms: &[&str]) -> bool {
		terms.iter().any(|t| self.has(t))
	}

	fn count(&self, terms: &[&str]) -> usize {
		terms.iter().filter(|t| self.has(t)).count()
	}
}

const HERO_TABS: [&str; 4] = ["summary", "skills", "loadout", "achievements"];
const OPTION_PANELS: [&str; 6] = ["interface", "graphics", "audio", "controls", "gameplay", "display"];

fn options_menu_visible(h: &Hits) -> bool {
	let header = h.any(&["options", "settings"]);
	let panel = h.any(&OPTION_PANELS);
	(h.has("options") && h.has("menu")) || (header && panel) || (h.has("hero") && panel)
}

fn hero_window_visible(h: &Hits) -> bool {
	let tabs = h.count(&HERO_TABS);
	(h.has("hero") && tabs >= 2) || tabs == HERO_TABS.len()
}

fn top_tab_selected(h: &Hits, normalized: &[String]) -> bool {
	super::text::count_containing(normalized, "achievements") >= 2 || (h.has("skills") && h.has("combat") && h.has("lore"))
}

fn subtab_selected(h: &Hits) -> bool {
	(h.has("show") && h.has("completed")) || (h.has("show") && h.has("locked")) || (h.has("select") && h.has("category"))
}

fn visible_categories(normalized: &[String], h: &Hits, schema: &CategorySchema) -> BTreeSet<Category> {
	schema
		.names()
		.filter(|category| {
			let full = normalize_token(category.name());
			let first = normalize_token(category.name().split(' ').next().unwrap_or_default());
			normalized.iter().any(|t| t.contains(&full)) || h.0.contains_key(full.as_str()) || h.0.contains_key(first.as_str())
		})
		.collect()
}

/// Term groups tried in order; the first group with a positioned fragment wins.
fn group_target(tokens: &[Token], groups: &[&[&str]]) -> Option<DetectedTarget> {
	groups.iter().find_map(|terms| {
		let matched = tokens.iter().filter(|t| terms.iter().any(|term| token_matches(t, term)));
		let rect = bounding_rect(matched)?;
		let term_hits = terms
			.iter()
			.filter(|term| tokens.iter().any(|t| token_matches(t, term)))
			.count();
		Some(DetectedTarget {
			rect,
			confidence: (0.45 + term_hits as f32 * 0.14).min(1.0),
		})
	})
}

/// The first fragment containing `term`, if it is positioned.
fn token_target(tokens: &[Token], term: &str) -> Option<DetectedTarget> {
	let token = tokens.iter().find(|t| token_matches(t, term))?;
	Some(DetectedTarget {
		rect: token.rect?,
		confidence: token.confidence_or(TOKEN_TARGET_CONFIDENCE),
	})
}

fn rail_target(tokens: &[Token], schema: &CategorySchema) -> Option<Rect> {
	let names: Vec<Category> = schema.names().collect();
	let rect = bounding_rect(tokens.iter().filter(|t| names.iter().any(|c| token_matches(t, c.name()))))?;
	let (x, y) = ((rect.x - 12).max(0), (rect.y - 10).max(0));
	Some(Rect::new(x, y, rect.width + 24, rect.height + 28))
}

/// Everything the text fallback can say about `tokens`.
pub fn detect_text(tokens: &[Token], schema: &CategorySchema) -> Signals {
	let normalized = normalized_texts(tokens);
	let hits = Hits(lexicon_hits(tokens));
	let visible = visible_categories(&normalized, &hits, schema);
	tracing::trace!(hits = ?hits.0, "lexicon hits");

	Signals {
		has_options_menu: options_menu_visible(&hits).then_some(true),
		has_hero_window: hero_window_visible(&hits).then_some(true),
		options_menu_target: group_target(tokens, &[&["options", "menu", "layout"], &["logout", "worlds", "issue"]]),
		hero_button_target: token_target(tokens, "hero"),
		hero_window_target: group_target(tokens, &[&HERO_TABS, &["hero", "achievements"]]),
		top_tab_target: token_target(tokens, "achievements"),
		subtab_target: group_target(tokens, &[&["show", "completed", "locked"], &["select", "category"]]),
		top_tab_selected: top_tab_selected(&hits, &normalized).then_some(true),
		subtab_selected: subtab_selected(&hits).then_some(true),
		category_rail: rail_target(tokens, schema),
		visible_categories: (!visible.is_empty()).then_some(visible),
		..Signals::default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(texts: &[&str]) -> Vec<Token> {
		texts.iter().map(|t| Token::new(*t)).collect()
	}

	#[test]
	fn containment_beats_edit_distance() {
		assert_eq!(term_similarity("showlocked", "locked"), 0.95);
		assert!((term_similarity("loadlayout", "loadout") - 0.7).abs() < 1e-6);
		assert_eq!(term_similarity("xyz", "achievements"), 0.0);
	}

	#[test]
	fn misread_terms_still_hit() {
		let hits = lexicon_hits(&tokens(&["Achievemnts"]));
		let score = hits["achievements"];
		assert!(score >= 0.65 && score < 0.95, "{score}");
	}

	#[test]
	fn one_term_never_makes_a_composite() {
		let signals = detect_text(&tokens(&["Options"]), &CategorySchema::bundled());
		assert_eq!(signals.has_options_menu, None);
		let signals = detect_text(&tokens(&["Hero"]), &CategorySchema::bundled());
		assert_eq!(signals.has_hero_window, None);
	}

	#[test]
	fn options_menu_fixture() {
		let signals = detect_text(
			&tokens(&["OPTIONS", "MENU", "Load Layout", "Logout", "Hero"]),
			&CategorySchema::bundled(),
		);
		assert_eq!(signals.has_options_menu, Some(true));
		assert_eq!(signals.has_hero_window, None);
	}

	#[test]
	fn hero_window_needs_two_tabs_besides_the_title() {
		let schema = CategorySchema::bundled();
		let signals = detect_text(&tokens(&["HERO", "Summary", "Skills"]), &schema);
		assert_eq!(signals.has_hero_window, Some(true));
		let signals = detect_text(&tokens(&["Summary", "Skills", "Loadout", "Achievements"]), &schema);
		assert_eq!(signals.has_hero_window, Some(true));
	}

	#[test]
	fn targets_follow_positioned_fragments() {
		let frame = vec![
			Token::new("Options").with_rect(Rect::new(100, 40, 80, 20)),
			Token::new("Menu").with_rect(Rect::new(190, 40, 50, 20)),
			Token::new("Hero").with_rect(Rect::new(120, 200, 60, 24)).with_confidence(0.9),
		];
		let signals = detect_text(&frame, &CategorySchema::bundled());
		let menu = signals.options_menu_target.unwrap();
		assert_eq!(menu.rect, Rect::new(100, 40, 140, 20));
		assert!((menu.confidence - 0.73).abs() < 1e-5);
		let hero = signals.hero_button_target.unwrap();
		assert_eq!(hero.rect, Rect::new(120, 200, 60, 24));
		assert_eq!(hero.confidence, 0.9);
	}

	#[test]
	fn rail_is_padded_around_category_names() {
		let frame = vec![
			Token::new("Skills").with_rect(Rect::new(5, 100, 60, 20)),
			Token::new("Lore").with_rect(Rect::new(5, 160, 40, 20)),
		];
		let signals = detect_text(&frame, &CategorySchema::bundled());
		assert_eq!(signals.category_rail, Some(Rect::new(0, 90, 84, 108)));
		let visible = signals.visible_categories.unwrap();
		assert!(visible.contains(&Category::Skills) && visible.contains(&Category::Lore));
	}
}
