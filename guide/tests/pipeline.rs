use std::sync::Arc;

use data::CategorySchema;
use guide::detect::{AnchorCatalog, AnchorKey, JsonHitSearch, LoadedAnchor};
use guide::{
	BootstrapState, DisplayPreference, GuideConfig, Phase, Pipeline, RawFrame, Rect, Signals, Token,
};
use ie::{Color, OwnedImage, Template};

const BACKGROUND: Color = Color::new(20, 20, 20);
const PATCH: (u32, u32) = (6, 5);

fn text_pipeline() -> Pipeline {
	Pipeline::new(
		Arc::new(AnchorCatalog::empty()),
		Arc::new(CategorySchema::bundled()),
		GuideConfig::default(),
	)
}

fn tokens(texts: &[&str]) -> Vec<Token> {
	texts.iter().copied().map(Token::new).collect()
}

/// A frame with one distinct colored patch per anchor, plus templates cut from it.
fn painted(anchors: &[AnchorKey]) -> (OwnedImage, Vec<(AnchorKey, Template, Rect)>) {
	let (width, height) = (200u32, 60u32);
	let mut pixels = vec![BACKGROUND; (width * height) as usize];
	let mut placed = Vec::new();
	for (i, key) in anchors.iter().enumerate() {
		let seed = (i as u8).wrapping_mul(45);
		let (x0, y0) = (10 + i as u32 * 30, 10 + (i as u32 % 2) * 25);
		for dy in 0..PATCH.1 {
			for dx in 0..PATCH.0 {
				pixels[((y0 + dy) * width + x0 + dx) as usize] =
					Color::new(seed.wrapping_add(dx as u8 * 23), 40 + dy as u8 * 31, 255 - seed);
			}
		}
		placed.push((*key, Rect::new(x0 as i32, y0 as i32, PATCH.0, PATCH.1)));
	}

	let Some(image) = OwnedImage::from_pixels(width, height, pixels) else {
		panic!("pixel count mismatch");
	};
	let templates = placed
		.into_iter()
		.map(|(key, rect)| {
			let crop = image
				.as_image()
				.sub_image(rect.x as u32, rect.y as u32, rect.width, rect.height)
				.to_owned_image();
			(key, Template::from_image(crop), rect)
		})
		.collect();
	(image, templates)
}

fn pixel_pipeline(templates: &[(AnchorKey, Template, Rect)]) -> Pipeline {
	let catalog = AnchorCatalog::from_templates(templates.iter().map(|(k, t, _)| (*k, t.clone())));
	Pipeline::new(Arc::new(catalog), Arc::new(CategorySchema::bundled()), GuideConfig::default())
}

#[test]
fn options_menu_fragments_ask_for_the_hero_button() {
	let frame = RawFrame::from_tokens(tokens(&["OPTIONS", "MENU", "Load Layout", "Logout", "Hero"]));
	let update = text_pipeline().evaluate_frame(&frame);
	assert_eq!(update.phase, Phase::Bootstrap);
	assert_eq!(update.state, BootstrapState::WaitHeroWindow);
	assert!(update.instruction.message.contains("Hero button"), "{}", update.instruction.message);
	assert_eq!(update.frame_stats.token_count, 5);
	assert_eq!(update.frame_stats.sample_tokens, vec!["OPTIONS", "MENU", "Load Layout", "Logout"]);
}

#[test]
fn baseline_achievements_screen_is_ready() {
	let frame = RawFrame::from_tokens(tokens(&[
		"HERO",
		"Summary",
		"Skills",
		"Loadout",
		"Achievements",
		"show completed",
		"show locked",
		"skills",
		"exploration",
		"area tasks",
		"combat",
		"lore",
		"activities",
		"completionist",
		"feats",
	]));
	let update = text_pipeline().evaluate_frame(&frame);
	assert_eq!(update.phase, Phase::Ready);
	assert_eq!(update.state, BootstrapState::ReadyForGuidedScan);
	assert_eq!(update.instruction.highlight, None);
}

#[test]
fn partial_category_list_asks_to_normalize() {
	let frame = RawFrame::from_tokens(tokens(&[
		"HERO",
		"Summary",
		"Skills",
		"Loadout",
		"Achievements",
		"show completed",
		"show locked",
		"Combat",
		"Lore",
	]));
	let update = text_pipeline().evaluate_frame(&frame);
	assert_eq!(update.phase, Phase::Normalize);
	assert_eq!(update.state, BootstrapState::WaitCategoryBaseline);
	assert!(update.instruction.message.starts_with("Category layout is not baseline"));
}

#[test]
fn positioned_fragments_give_a_padded_rail() {
	let frame = RawFrame::from_tokens(vec![
		Token::new("HERO"),
		Token::new("Summary"),
		Token::new("Skills").with_rect(Rect::new(40, 120, 60, 18)),
		Token::new("Loadout"),
		Token::new("Achievements"),
		Token::new("show locked"),
		Token::new("Combat").with_rect(Rect::new(40, 150, 70, 18)),
		Token::new("Lore").with_rect(Rect::new(40, 180, 40, 18)),
	]);
	let update = text_pipeline().evaluate_frame(&frame);
	assert_eq!(update.phase, Phase::Normalize);
	assert_eq!(update.instruction.highlight, Some(Rect::new(28, 110, 94, 106)));
}

#[test]
fn injected_signals_override_recognition() {
	let frame = RawFrame::from_tokens(tokens(&["OPTIONS", "MENU", "Load Layout", "Logout", "Hero"])).with_precomputed(
		Signals {
			has_hero_window: Some(true),
			top_tab_selected: Some(false),
			..Default::default()
		},
	);
	let update = text_pipeline().evaluate_frame(&frame);
	assert_eq!(update.state, BootstrapState::WaitAchievementsTopTab);
	assert_eq!(update.phase, Phase::Bootstrap);
}

#[test]
fn injected_preference_mismatch_blocks_the_gate() {
	let frame = RawFrame::from_tokens(Vec::new()).with_precomputed(Signals {
		has_hero_window: Some(true),
		top_tab_selected: Some(true),
		subtab_selected: Some(true),
		show_locked: Some(true),
		show_completed: Some(true),
		list_mode: Some(false),
		..Default::default()
	});
	let update = text_pipeline().evaluate_frame(&frame);
	assert_eq!(update.phase, Phase::Preferences);
	assert_eq!(update.state, BootstrapState::WaitDisplayPreferences);
	assert!(update.instruction.message.contains("Show completed"));
}

#[test]
fn template_matches_locate_the_hero_button() {
	let (image, templates) = painted(&[AnchorKey::OptionsMenu, AnchorKey::HeroButton]);
	let button = templates[1].2;
	let frame = RawFrame::from_tokens(Vec::new()).with_image(image);

	let update = pixel_pipeline(&templates).evaluate_frame(&frame);
	assert_eq!(update.state, BootstrapState::WaitHeroWindow);
	assert_eq!(update.instruction.highlight, Some(button));
	assert_eq!(update.frame_stats.matched_anchors, vec!["options_menu", "hero_button"]);
}

#[test]
fn unread_preferences_block_frames_with_pixels() {
	let gates = [
		AnchorKey::HeroWindow,
		AnchorKey::AchievementsTab { selected: true },
		AnchorKey::AchievementsSubtab { selected: true },
	];
	let (image, templates) = painted(&gates);
	let update = pixel_pipeline(&templates).evaluate_frame(&RawFrame::from_tokens(Vec::new()).with_image(image));
	assert_eq!(update.phase, Phase::Preferences);
	assert!(update.instruction.message.contains("Show locked"));

	let with_preferences: Vec<AnchorKey> = gates
		.into_iter()
		.chain([
			AnchorKey::Preference {
				preference: DisplayPreference::ShowLocked,
				checked: true,
			},
			AnchorKey::Preference {
				preference: DisplayPreference::ShowCompleted,
				checked: false,
			},
			AnchorKey::Preference {
				preference: DisplayPreference::ListMode,
				checked: false,
			},
		])
		.collect();
	let (image, templates) = painted(&with_preferences);
	let update = pixel_pipeline(&templates).evaluate_frame(&RawFrame::from_tokens(Vec::new()).with_image(image));
	assert_eq!(update.state, BootstrapState::WaitCategoryBaseline);
	assert_eq!(update.phase, Phase::Normalize);
}

#[test]
fn external_hit_lists_feed_the_detector() {
	let (_, templates) = painted(&[AnchorKey::OptionsMenu, AnchorKey::HeroButton]);
	let search = JsonHitSearch::new(|_handle: u64, _size: (u32, u32), anchor: &LoadedAnchor| -> Option<String> {
		match anchor.definition.key {
			AnchorKey::OptionsMenu => Some(r#"[{"x":310,"y":42}]"#.to_string()),
			AnchorKey::HeroButton => Some("{not a hit list".to_string()),
			_ => None,
		}
	});
	let pipeline = pixel_pipeline(&templates).with_search(search);

	let mut frame = RawFrame::from_tokens(Vec::new());
	frame.handle = Some(7);
	frame.width = 1280;
	frame.height = 720;

	let update = pipeline.evaluate_frame(&frame);
	assert_eq!(update.state, BootstrapState::WaitHeroWindow);
	assert_eq!(update.frame_stats.matched_anchors, vec!["options_menu"]);
	// The malformed list for the hero button counts as no match.
	assert_eq!(update.instruction.highlight, None);
}

#[test]
fn frames_without_a_handle_never_reach_the_backend() {
	let (_, templates) = painted(&[AnchorKey::OptionsMenu]);
	let search = JsonHitSearch::new(|_: u64, _: (u32, u32), _: &LoadedAnchor| -> Option<String> {
		panic!("backend called without a capture handle")
	});
	let update = pixel_pipeline(&templates)
		.with_search(search)
		.evaluate_frame(&RawFrame::from_tokens(Vec::new()));
	assert_eq!(update.state, BootstrapState::WaitOptionsMenu);
}
