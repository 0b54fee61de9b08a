use data::CategorySchema;

use crate::{BootstrapState, DisplayPreference, FrameSnapshot, GuideInstruction, Rect, Signals, instructions};

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapStep {
	pub state: BootstrapState,
	pub instruction: GuideInstruction,
}

/// Outcome of the display-preference gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceGate {
	pub ready: bool,
	/// The preference the user should look at next.
	pub next: Option<DisplayPreference>,
	pub highlight: Option<Rect>,
}

/// Check the three preferences in fixed order.
///
/// A known mismatch is reported first; otherwise the first unknown one.
pub fn evaluate_display_preferences(signals: &Signals) -> PreferenceGate {
	let blocked = |preference: DisplayPreference| PreferenceGate {
		ready: false,
		next: Some(preference),
		highlight: preference.target_rect(signals),
	};

	let mismatch = DisplayPreference::ALL
		.into_iter()
		.find(|p| p.current(signals).is_some_and(|v| v != p.target()));
	if let Some(preference) = mismatch {
		return blocked(preference);
	}

	match DisplayPreference::ALL.into_iter().find(|p| p.current(signals).is_none()) {
		Some(preference) => blocked(preference),
		None => PreferenceGate {
			ready: true,
			next: None,
			highlight: None,
		},
	}
}

/// Walk the gates from the first one; stop at the first that does not hold.
///
/// Pure: the same snapshot always yields the same step.
pub fn run_bootstrap_step(snapshot: &FrameSnapshot, schema: &CategorySchema) -> BootstrapStep {
	let signals = &snapshot.signals;
	let rect = |target: Option<crate::DetectedTarget>| target.map(|t| t.rect);

	if signals.has_hero_window != Some(true) {
		return if signals.has_options_menu == Some(true) {
			BootstrapStep {
				state: BootstrapState::WaitHeroWindow,
				instruction: instructions::click_hero_button(rect(signals.hero_button_target)),
			}
		} else {
			BootstrapStep {
				state: BootstrapState::WaitOptionsMenu,
				instruction: instructions::open_options_menu(),
			}
		};
	}

	if signals.top_tab_selected != Some(true) {
		return BootstrapStep {
			state: BootstrapState::WaitAchievementsTopTab,
			instruction: instructions::click_achievements_tab(rect(signals.top_tab_target)),
		};
	}

	if signals.subtab_selected != Some(true) {
		return BootstrapStep {
			state: BootstrapState::WaitAchievementsSubtab,
			instruction: instructions::click_achievements_subtab(rect(signals.subtab_target)),
		};
	}

	let gate = evaluate_display_preferences(signals);
	if !gate.ready {
		return BootstrapStep {
			state: BootstrapState::WaitDisplayPreferences,
			instruction: instructions::fix_display_preference(gate.next, gate.highlight),
		};
	}

	BootstrapStep {
		state: BootstrapState::WaitCategoryBaseline,
		instruction: instructions::start_category_normalization(schema.len()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::DetectedTarget;

	fn at_preferences() -> Signals {
		Signals {
			has_hero_window: Some(true),
			top_tab_selected: Some(true),
			subtab_selected: Some(true),
			..Default::default()
		}
	}

	fn step(signals: Signals) -> BootstrapStep {
		run_bootstrap_step(&FrameSnapshot::from_signals(signals), &CategorySchema::bundled())
	}

	#[test]
	fn without_hero_window_or_menu_asks_for_the_menu() {
		let signals = Signals {
			has_hero_window: Some(false),
			top_tab_selected: Some(true),
			subtab_selected: Some(true),
			show_locked: Some(true),
			show_completed: Some(false),
			list_mode: Some(false),
			..Default::default()
		};
		assert_eq!(step(signals).state, BootstrapState::WaitOptionsMenu);
	}

	#[test]
	fn open_menu_points_at_the_hero_button() {
		let button = Rect::new(40, 80, 90, 30);
		let result = step(Signals {
			has_options_menu: Some(true),
			hero_button_target: Some(DetectedTarget {
				rect: button,
				confidence: 0.9,
			}),
			..Default::default()
		});
		assert_eq!(result.state, BootstrapState::WaitHeroWindow);
		assert_eq!(result.instruction.highlight, Some(button));
		assert!(result.instruction.message.contains("Hero button"));
	}

	#[test]
	fn tabs_are_checked_in_order() {
		let mut signals = at_preferences();
		signals.top_tab_selected = Some(false);
		signals.subtab_selected = Some(false);
		assert_eq!(step(signals.clone()).state, BootstrapState::WaitAchievementsTopTab);
		signals.top_tab_selected = Some(true);
		assert_eq!(step(signals).state, BootstrapState::WaitAchievementsSubtab);
	}

	#[test]
	fn all_gates_passed_reaches_category_baseline() {
		let mut signals = at_preferences();
		signals.show_locked = Some(true);
		signals.show_completed = Some(false);
		signals.list_mode = Some(false);
		assert_eq!(step(signals).state, BootstrapState::WaitCategoryBaseline);
	}

	#[test]
	fn first_mismatch_in_fixed_order() {
		let mut signals = at_preferences();
		signals.show_locked = Some(false);
		signals.show_completed = Some(false);
		signals.list_mode = Some(false);
		assert_eq!(evaluate_display_preferences(&signals).next, Some(DisplayPreference::ShowLocked));
	}

	#[test]
	fn mismatch_outranks_an_earlier_unknown() {
		let mut signals = at_preferences();
		signals.list_mode = Some(true);
		signals.list_mode_target = Some(DetectedTarget {
			rect: Rect::new(1, 2, 3, 4),
			confidence: 0.8,
		});
		let gate = evaluate_display_preferences(&signals);
		assert_eq!(gate.next, Some(DisplayPreference::ListMode));
		assert_eq!(gate.highlight, Some(Rect::new(1, 2, 3, 4)));
	}

	#[test]
	fn unknown_preference_blocks_without_highlight() {
		let mut signals = at_preferences();
		signals.show_locked = Some(true);
		signals.list_mode = Some(false);
		let gate = evaluate_display_preferences(&signals);
		assert!(!gate.ready);
		assert_eq!(gate.next, Some(DisplayPreference::ShowCompleted));
		assert_eq!(gate.highlight, None);
	}
}
