//! Sub-image search backends used by the template detector.

use anyhow::{Context, Result};
use ie::Hit;

use super::LoadedAnchor;
use crate::RawFrame;

/// Locates one anchor inside a frame.
///
/// Implementations never fail: anything that goes wrong is "no match".
pub trait AnchorSearch {
	fn find(&self, frame: &RawFrame, anchor: &LoadedAnchor) -> Vec<Hit>;
}

/// Searches the frame's own pixels.
#[derive(Debug, Clone, Copy)]
pub struct PixelSearch {
	pub max_deviation: f32,
	pub max_hits: usize,
}

impl PixelSearch {
	pub fn from_config(config: &crate::GuideConfig) -> Self {
		Self {
			max_deviation: config.match_threshold,
			max_hits: config.max_hits_per_anchor.max(1),
		}
	}
}

impl AnchorSearch for PixelSearch {
	fn find(&self, frame: &RawFrame, anchor: &LoadedAnchor) -> Vec<Hit> {
		let Some(image) = &frame.image else {
			return Vec::new();
		};
		ie::find_template(image.as_image(), &anchor.template, self.max_deviation, self.max_hits)
	}
}

/// Delegates to a backend that searches a capture by handle and reports hits as JSON.
pub struct JsonHitSearch<F> {
	backend: F,
}

impl<F> JsonHitSearch<F>
where
	F: Fn(u64, (u32, u32), &LoadedAnchor) -> Option<String>,
{
	/// `backend(handle, (frame_width, frame_height), anchor)` returns the raw hit list,
	/// or `None` when it found nothing.
	pub fn new(backend: F) -> Self {
		Self { backend }
	}
}

impl<F> AnchorSearch for JsonHitSearch<F>
where
	F: Fn(u64, (u32, u32), &LoadedAnchor) -> Option<String>,
{
	fn find(&self, frame: &RawFrame, anchor: &LoadedAnchor) -> Vec<Hit> {
		let Some(handle) = frame.handle else {
			return Vec::new();
		};
		if frame.width == 0 || frame.height == 0 {
			return Vec::new();
		}
		let Some(raw) = (self.backend)(handle, (frame.width, frame.height), anchor) else {
			return Vec::new();
		};
		match parse_hit_list(&raw) {
			Ok(hits) => hits,
			Err(err) => {
				tracing::debug!(anchor = %anchor.definition.key, error = %err, "malformed hit list; treating as no match");
				Vec::new()
			}
		}
	}
}

/// Parse `[{"x":..,"y":..}, ...]`.
pub fn parse_hit_list(raw: &str) -> Result<Vec<Hit>> {
	serde_json::from_str(raw).context("parse hit list")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hit_lists() {
		let hits = parse_hit_list(r#"[{"x":3,"y":4},{"x":10,"y":0}]"#).unwrap();
		assert_eq!(hits, vec![Hit { x: 3, y: 4 }, Hit { x: 10, y: 0 }]);
		assert!(parse_hit_list("[]").unwrap().is_empty());
	}

	#[test]
	fn rejects_malformed_lists() {
		assert!(parse_hit_list("not json").is_err());
		assert!(parse_hit_list(r#"[{"x":-1,"y":2}]"#).is_err());
		assert!(parse_hit_list(r#"{"x":1,"y":2}"#).is_err());
	}
}
