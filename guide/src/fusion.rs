//! Signal fusion: precomputed signals, then Tier A, then Tier B.

use std::time::Instant;

use data::CategorySchema;

use crate::detect::{AnchorCatalog, AnchorSearch, detect_anchors, detect_text};
use crate::{DisplayPreference, FrameSnapshot, GuideConfig, RawFrame, Signals};

/// Merge detector layers field by field. Higher layers are never overridden.
pub fn fuse(precomputed: Option<Signals>, template: Signals, text: Option<Signals>) -> Signals {
	let merged = template.or(text.unwrap_or_default());
	match precomputed {
		Some(precomputed) => precomputed.or(merged),
		None => merged,
	}
}

/// Checkbox state cannot be read from text; a pixel-less frame gets the targets.
fn assume_preferences(signals: &mut Signals) {
	for preference in DisplayPreference::ALL {
		let slot = match preference {
			DisplayPreference::ShowLocked => &mut signals.show_locked,
			DisplayPreference::ShowCompleted => &mut signals.show_completed,
			DisplayPreference::ListMode => &mut signals.list_mode,
		};
		slot.get_or_insert(preference.target());
	}
}

pub(crate) fn elapsed_ms(since: Instant) -> f64 {
	since.elapsed().as_secs_f64() * 1000.0
}

/// Run both detector tiers over `frame` and fuse the results into a snapshot.
pub fn build_snapshot(
	frame: &RawFrame,
	catalog: &AnchorCatalog,
	search: &dyn AnchorSearch,
	schema: &CategorySchema,
	config: &GuideConfig,
) -> FrameSnapshot {
	let started = Instant::now();
	let template = detect_anchors(frame, catalog, search, schema);
	let finder_ms = elapsed_ms(started);

	let recognition_started = Instant::now();
	let text = if template.matched < config.fallback_min_anchor_hits {
		tracing::debug!(matched = template.matched, "few anchors matched; using text fallback");
		Some(detect_text(&frame.tokens, schema))
	} else {
		None
	};
	let recognition_ms = elapsed_ms(recognition_started);

	let mut signals = fuse(frame.precomputed.clone(), template.signals, text);
	let has_pixels = frame.image.is_some() || frame.handle.is_some();
	if !has_pixels && config.assume_preferences_without_pixels {
		assume_preferences(&mut signals);
	}

	signals.telemetry.finder_ms = Some(finder_ms);
	signals.telemetry.recognition_ms = Some(recognition_ms);
	signals.telemetry.total_ms = Some(elapsed_ms(started));

	FrameSnapshot {
		tokens: frame.tokens.clone(),
		tick: None,
		captured_at: Some(frame.captured_at),
		signals,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Token;

	#[test]
	fn precedence_is_precomputed_then_template_then_text() {
		let precomputed = Signals {
			top_tab_selected: Some(false),
			..Default::default()
		};
		let template = Signals {
			top_tab_selected: Some(true),
			subtab_selected: Some(false),
			..Default::default()
		};
		let text = Signals {
			subtab_selected: Some(true),
			has_hero_window: Some(true),
			..Default::default()
		};
		let fused = fuse(Some(precomputed), template, Some(text));
		assert_eq!(fused.top_tab_selected, Some(false));
		assert_eq!(fused.subtab_selected, Some(false));
		assert_eq!(fused.has_hero_window, Some(true));
		assert_eq!(fused.has_options_menu, None);
	}

	#[test]
	fn text_only_frames_assume_preference_targets() {
		let frame = RawFrame::from_tokens(vec![Token::new("Show locked")]);
		let schema = CategorySchema::bundled();
		let snapshot = build_snapshot(
			&frame,
			&AnchorCatalog::empty(),
			&crate::detect::PixelSearch {
				max_deviation: 1.0,
				max_hits: 1,
			},
			&schema,
			&GuideConfig::default(),
		);
		assert_eq!(snapshot.signals.show_locked, Some(true));
		assert_eq!(snapshot.signals.show_completed, Some(false));
		assert_eq!(snapshot.signals.list_mode, Some(false));

		let config = GuideConfig {
			assume_preferences_without_pixels: false,
			..Default::default()
		};
		let snapshot = build_snapshot(
			&frame,
			&AnchorCatalog::empty(),
			&crate::detect::PixelSearch::from_config(&config),
			&schema,
			&config,
		);
		assert_eq!(snapshot.signals.show_locked, None);
	}

	#[test]
	fn injected_preferences_are_not_overwritten() {
		let frame = RawFrame::from_tokens(Vec::new()).with_precomputed(Signals {
			show_completed: Some(true),
			..Default::default()
		});
		let config = GuideConfig::default();
		let snapshot = build_snapshot(
			&frame,
			&AnchorCatalog::empty(),
			&crate::detect::PixelSearch::from_config(&config),
			&CategorySchema::bundled(),
			&config,
		);
		assert_eq!(snapshot.signals.show_completed, Some(true));
		assert!(snapshot.signals.telemetry.total_ms.is_some());
	}
}
