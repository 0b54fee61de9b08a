//! Normalized-text helpers shared by the text detectors.

use crate::{Rect, Token};

static NON_ALNUM: std::sync::LazyLock<regex::Regex> =
	std::sync::LazyLock::new(|| regex::Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercase and strip everything but ASCII letters and digits.
pub fn normalize_token(text: &str) -> String {
	NON_ALNUM.replace_all(&text.to_lowercase(), "").into_owned()
}

/// Normalized texts of every fragment, empty ones dropped.
pub fn normalized_texts(tokens: &[Token]) -> Vec<String> {
	tokens
		.iter()
		.map(|t| normalize_token(&t.text))
		.filter(|t| !t.is_empty())
		.collect()
}

/// Whether a fragment contains `term` once both are normalized.
pub fn token_matches(token: &Token, term: &str) -> bool {
	let needle = normalize_token(term);
	!needle.is_empty() && normalize_token(&token.text).contains(&needle)
}

pub fn count_containing(normalized: &[String], needle: &str) -> usize {
	let needle = normalize_token(needle);
	if needle.is_empty() {
		return 0;
	}
	normalized.iter().filter(|t| t.contains(&needle)).count()
}

/// Bounding box of the fragments that carry a rectangle.
pub fn bounding_rect<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> Option<Rect> {
	Rect::union(tokens.into_iter().filter_map(|t| t.rect))
}
