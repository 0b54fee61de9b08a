//! Tuning knobs for the recognition-and-guidance pipeline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
	/// Upper bound on sampling rate; one base tick lasts `1000 / max_fps` ms.
	pub max_fps: u32,

	/// Requested interval between evaluations. Rounded to a power-of-two
	/// multiple of the base tick.
	pub interval_ms: u64,

	/// The text fallback engages when fewer anchors than this matched.
	pub fallback_min_anchor_hits: usize,

	/// Highest masked average deviation accepted as a template hit.
	pub match_threshold: f32,

	/// Hits collected per anchor before the search stops.
	pub max_hits_per_anchor: usize,

	/// Fill display preferences with their targets for frames without pixels.
	pub assume_preferences_without_pixels: bool,
}

impl Default for GuideConfig {
	fn default() -> Self {
		Self {
			max_fps: 60,
			interval_ms: 50,
			fallback_min_anchor_hits: 3,
			match_threshold: 1.0,
			max_hits_per_anchor: 4,
			assume_preferences_without_pixels: true,
		}
	}
}

impl GuideConfig {
	/// Length of one base tick in milliseconds.
	pub fn base_tick_ms(&self) -> f64 {
		1000.0 / self.max_fps.max(1) as f64
	}
}
