//! User-facing instruction texts.

use data::Category;

use crate::{DisplayPreference, GuideInstruction, Rect};

/// How the category-normalization highlight was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightMode {
	/// The expanded category's own header: a precise click target.
	Header,
	/// The generic expanded-section marker next to the scrollbar.
	Scrollbar,
	/// The whole category rail.
	Rail,
}

pub fn open_options_menu() -> GuideInstruction {
	GuideInstruction::new("Open the Options menu (press Esc or click the settings cog).", None)
}

pub fn click_hero_button(highlight: Option<Rect>) -> GuideInstruction {
	GuideInstruction::new("Click the highlighted Hero button in the Options menu.", highlight)
}

pub fn click_achievements_tab(highlight: Option<Rect>) -> GuideInstruction {
	GuideInstruction::new("Click the highlighted Achievements tab in the Hero window.", highlight)
}

pub fn click_achievements_subtab(highlight: Option<Rect>) -> GuideInstruction {
	GuideInstruction::new("Click the highlighted Achievements sub-tab icon.", highlight)
}

pub fn fix_display_preference(preference: Option<DisplayPreference>, highlight: Option<Rect>) -> GuideInstruction {
	let message = match preference {
		Some(DisplayPreference::ShowLocked) => "Enable Show locked (checked) to continue.",
		Some(DisplayPreference::ShowCompleted) => "Disable Show completed (unchecked) to continue.",
		Some(DisplayPreference::ListMode) => "Disable List mode (unchecked) to continue.",
		None => "Set the list filters: Show locked checked, Show completed unchecked, List mode unchecked.",
	};
	GuideInstruction::new(message, highlight)
}

pub fn start_category_normalization(expected: usize) -> GuideInstruction {
	GuideInstruction::new(
		format!("Achievements sub-tab verified. Checking the category layout ({expected} categories expected)."),
		None,
	)
}

pub fn normalize_category_layout(
	mode: HighlightMode,
	category: Option<Category>,
	highlight: Option<Rect>,
) -> GuideInstruction {
	let prefix = category
		.map(|c| format!("Likely expanded category: {c}. "))
		.unwrap_or_default();
	let action = match mode {
		HighlightMode::Header => "Click the highlighted category header to collapse it.",
		HighlightMode::Scrollbar => {
			"Category layout is not baseline. Scroll up until the expanded category header is visible, then click it to collapse."
		}
		HighlightMode::Rail => {
			"Category layout is not baseline. Scroll in the highlighted rail until every category header is visible and none is expanded."
		}
	};
	GuideInstruction::new(format!("{prefix}{action}"), highlight)
}

pub fn ready_for_guided_scan() -> GuideInstruction {
	GuideInstruction::new("Interface verified. Ready to begin the guided scan.", None)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalization_message_names_the_category() {
		let text = normalize_category_layout(HighlightMode::Header, Some(Category::AreaTasks), None).message;
		assert!(text.starts_with("Likely expanded category: area tasks. "));
		let text = normalize_category_layout(HighlightMode::Rail, None, None).message;
		assert!(text.starts_with("Category layout"));
	}
}
