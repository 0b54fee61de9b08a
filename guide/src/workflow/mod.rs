//! Workflow state machine: a pure function of one snapshot.

use std::fmt;

use data::{Category, CategorySchema};

use crate::{BootstrapState, FrameSnapshot, GuideInstruction};

mod bootstrap;
pub use bootstrap::{BootstrapStep, PreferenceGate, evaluate_display_preferences, run_bootstrap_step};
mod category;
pub use category::{
	ExpandedInference, InferenceSource, NormalizeStep, RailState, infer_expanded_category, normalize_category_layout,
};

/// Coarse progress reported to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
	Bootstrap,
	Preferences,
	Normalize,
	Ready,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Bootstrap => "bootstrap",
			Self::Preferences => "preferences",
			Self::Normalize => "normalize",
			Self::Ready => "ready",
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
	pub state: BootstrapState,
	pub phase: Phase,
	pub instruction: GuideInstruction,
	/// Category presumed expanded, during normalization.
	pub expanded: Option<Category>,
}

/// Run every gate, then category normalization once the gates pass.
pub fn evaluate(snapshot: &FrameSnapshot, schema: &CategorySchema) -> Evaluation {
	let step = run_bootstrap_step(snapshot, schema);
	if step.state != BootstrapState::WaitCategoryBaseline {
		let phase = if step.state == BootstrapState::WaitDisplayPreferences {
			Phase::Preferences
		} else {
			Phase::Bootstrap
		};
		return Evaluation {
			state: step.state,
			phase,
			instruction: step.instruction,
			expanded: None,
		};
	}

	let normalize = normalize_category_layout(snapshot, schema);
	let (state, phase) = if normalize.ready {
		(BootstrapState::ReadyForGuidedScan, Phase::Ready)
	} else {
		(BootstrapState::WaitCategoryBaseline, Phase::Normalize)
	};
	Evaluation {
		state,
		phase,
		instruction: normalize.instruction,
		expanded: normalize.expanded,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Signals;

	#[test]
	fn identical_snapshots_evaluate_identically() {
		let snapshot = FrameSnapshot::from_signals(Signals {
			has_hero_window: Some(true),
			top_tab_selected: Some(true),
			..Default::default()
		});
		let schema = CategorySchema::bundled();
		let first = evaluate(&snapshot, &schema);
		assert_eq!(first, evaluate(&snapshot, &schema));
		assert_eq!(first.state, BootstrapState::WaitAchievementsSubtab);
		assert_eq!(first.phase, Phase::Bootstrap);
	}

	#[test]
	fn full_baseline_is_ready() {
		let snapshot = FrameSnapshot::from_signals(Signals {
			has_hero_window: Some(true),
			top_tab_selected: Some(true),
			subtab_selected: Some(true),
			show_locked: Some(true),
			show_completed: Some(false),
			list_mode: Some(false),
			visible_categories: Some(Category::ALL.into_iter().collect()),
			..Default::default()
		});
		let result = evaluate(&snapshot, &CategorySchema::bundled());
		assert_eq!(result.state, BootstrapState::ReadyForGuidedScan);
		assert_eq!(result.phase, Phase::Ready);
	}
}
