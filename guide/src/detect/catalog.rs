//! Anchor catalog: reference snapshots of the UI controls the workflow looks for.
//!
//! The catalog is built once (usually from a folder of `<key>.png` files) and
//! then shared read-only by every detector call.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use data::Category;

use crate::{BootstrapState, DisplayPreference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryState {
	Collapsed,
	Expanded,
}

/// Identity of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnchorKey {
	OptionsMenu,
	HeroButton,
	HeroWindow,
	AchievementsTab { selected: bool },
	AchievementsSubtab { selected: bool },
	/// Baseline rail with every category collapsed. Two skins exist.
	AllCategoriesClosed { variant: u8 },
	/// Generic marker drawn next to whichever section is open.
	ExpandedCategory,
	ExpandedCategoryColor,
	/// A category header. Completionist's two collapsed looks are variants 1 and 2.
	CategoryHeader {
		category: Category,
		state: CategoryState,
		variant: u8,
	},
	Preference { preference: DisplayPreference, checked: bool },
}

impl AnchorKey {
	pub fn category(&self) -> Option<Category> {
		match self {
			Self::CategoryHeader { category, .. } => Some(*category),
			_ => None,
		}
	}

	pub fn is_expanded_header(&self) -> bool {
		matches!(
			self,
			Self::CategoryHeader {
				state: CategoryState::Expanded,
				..
			}
		)
	}
}

impl fmt::Display for AnchorKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {
			Self::OptionsMenu => f.write_str("options_menu"),
			Self::HeroButton => f.write_str("hero_button"),
			Self::HeroWindow => f.write_str("hero_window"),
			Self::AchievementsTab { selected: true } => f.write_str("achievements_tab_selected"),
			Self::AchievementsTab { selected: false } => f.write_str("achievements_tab_not_selected"),
			Self::AchievementsSubtab { selected: true } => f.write_str("achievements_subtab_selected"),
			Self::AchievementsSubtab { selected: false } => f.write_str("achievements_subtab_not_selected"),
			Self::AllCategoriesClosed { variant: 1 } => f.write_str("all_categories_closed"),
			Self::AllCategoriesClosed { variant } => write!(f, "all_categories_closed_{variant}"),
			Self::ExpandedCategory => f.write_str("expanded_category"),
			Self::ExpandedCategoryColor => f.write_str("expanded_category_color"),
			Self::CategoryHeader {
				category: Category::Completionist,
				state: CategoryState::Collapsed,
				variant,
			} => {
				let look = if variant >= 2 { "selected" } else { "unselected" };
				write!(f, "completionist_category_{look}")
			}
			Self::CategoryHeader {
				category,
				state: CategoryState::Collapsed,
				..
			} => write!(f, "{}_category", category.key()),
			Self::CategoryHeader {
				category,
				state: CategoryState::Expanded,
				variant: 1,
			} => write!(f, "{}_category_expanded", category.key()),
			Self::CategoryHeader {
				category,
				state: CategoryState::Expanded,
				variant,
			} => write!(f, "{}_category_expanded_{variant}", category.key()),
			Self::Preference { preference, checked } => {
				let state = if checked { "checked" } else { "unchecked" };
				write!(f, "{}_{state}", preference.key())
			}
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRole {
	Required,
	Optional,
}

/// Static metadata of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorDefinition {
	pub key: AnchorKey,
	/// Gate the anchor is evidence for.
	pub stage: BootstrapState,
	pub role: AnchorRole,
	/// Baseline confidence of a single hit.
	pub expected_confidence: f32,
}

impl AnchorDefinition {
	const fn new(key: AnchorKey, stage: BootstrapState, role: AnchorRole, expected_confidence: f32) -> Self {
		Self {
			key,
			stage,
			role,
			expected_confidence,
		}
	}

	/// Some expanded skins sit where only the generic marker makes a reliable click target.
	pub fn prefers_generic_highlight(&self) -> bool {
		matches!(
			self.key,
			AnchorKey::CategoryHeader {
				state: CategoryState::Expanded,
				variant: 3,
				..
			}
		)
	}
}

/// Expanded skins per category. Completionist never expands.
fn expanded_variants(category: Category) -> u8 {
	match category {
		Category::Completionist => 0,
		Category::Feats => 2,
		_ => 3,
	}
}

/// Every entry the catalog knows about, in search order.
pub fn definitions() -> Vec<AnchorDefinition> {
	use AnchorRole::*;
	use BootstrapState::*;

	let mut defs = vec![
		AnchorDefinition::new(AnchorKey::OptionsMenu, WaitOptionsMenu, Required, 0.86),
		AnchorDefinition::new(AnchorKey::HeroButton, WaitHeroWindow, Required, 0.86),
		AnchorDefinition::new(AnchorKey::HeroWindow, WaitHeroWindow, Required, 0.84),
		AnchorDefinition::new(AnchorKey::AchievementsTab { selected: true }, WaitAchievementsTopTab, Required, 0.86),
		AnchorDefinition::new(AnchorKey::AchievementsTab { selected: false }, WaitAchievementsTopTab, Required, 0.82),
		AnchorDefinition::new(AnchorKey::AchievementsSubtab { selected: true }, WaitAchievementsSubtab, Required, 0.86),
		AnchorDefinition::new(AnchorKey::AchievementsSubtab { selected: false }, WaitAchievementsSubtab, Optional, 0.80),
		AnchorDefinition::new(AnchorKey::AllCategoriesClosed { variant: 1 }, WaitCategoryBaseline, Required, 0.86),
		AnchorDefinition::new(AnchorKey::AllCategoriesClosed { variant: 2 }, WaitCategoryBaseline, Optional, 0.86),
		AnchorDefinition::new(AnchorKey::ExpandedCategory, WaitCategoryBaseline, Optional, 0.82),
	];

	for category in Category::ALL {
		let key = AnchorKey::CategoryHeader {
			category,
			state: CategoryState::Collapsed,
			variant: 1,
		};
		defs.push(AnchorDefinition::new(key, WaitCategoryBaseline, Required, 0.82));
	}
	defs.push(AnchorDefinition::new(
		AnchorKey::CategoryHeader {
			category: Category::Completionist,
			state: CategoryState::Collapsed,
			variant: 2,
		},
		WaitCategoryBaseline,
		Optional,
		0.80,
	));

	for category in Category::ALL {
		for variant in 1..=expanded_variants(category) {
			let key = AnchorKey::CategoryHeader {
				category,
				state: CategoryState::Expanded,
				variant,
			};
			defs.push(AnchorDefinition::new(key, WaitCategoryBaseline, Optional, 0.80));
		}
	}

	for preference in DisplayPreference::ALL {
		for checked in [true, false] {
			let key = AnchorKey::Preference { preference, checked };
			defs.push(AnchorDefinition::new(key, WaitDisplayPreferences, Optional, 0.82));
		}
	}

	defs.push(AnchorDefinition::new(AnchorKey::ExpandedCategoryColor, WaitCategoryBaseline, Optional, 0.74));
	defs
}

/// A catalog entry together with its reference pixels.
#[derive(Debug, Clone)]
pub struct LoadedAnchor {
	pub definition: AnchorDefinition,
	pub template: ie::Template,
}

/// Immutable set of loaded anchors. Build once, share behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct AnchorCatalog {
	anchors: Vec<LoadedAnchor>,
}

impl AnchorCatalog {
	pub fn empty() -> Self {
		Self::default()
	}

	/// Load `<key>.png` for every definition from `dir`.
	///
	/// Files that are missing or fail to decode are skipped with a warning;
	/// only an unreadable folder is an error.
	pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
		let dir = dir.as_ref();
		anyhow::ensure!(dir.is_dir(), "anchor folder {:?} does not exist", dir);

		let mut anchors = Vec::new();
		let mut skipped = 0usize;
		for definition in definitions() {
			let path = dir.join(format!("{}.png", definition.key));
			let loaded = std::fs::read(&path)
				.with_context(|| format!("read {:?}", path))
				.and_then(|bytes| ie::Template::from_png(&bytes).with_context(|| format!("decode {:?}", path)));
			match loaded {
				Ok(template) => anchors.push(LoadedAnchor { definition, template }),
				Err(err) => {
					tracing::warn!(anchor = %definition.key, error = %err, "skipping anchor");
					skipped += 1;
				}
			}
		}

		tracing::info!(loaded = anchors.len(), skipped, dir = ?dir, "anchor catalog loaded");
		Ok(Self { anchors })
	}

	/// Build a catalog from in-memory templates. Keys without a definition are ignored.
	pub fn from_templates(templates: impl IntoIterator<Item = (AnchorKey, ie::Template)>) -> Self {
		let defs = definitions();
		let anchors = templates
			.into_iter()
			.filter_map(|(key, template)| {
				let definition = *defs.iter().find(|d| d.key == key)?;
				Some(LoadedAnchor { definition, template })
			})
			.collect();
		Self { anchors }
	}

	pub fn len(&self) -> usize {
		self.anchors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.anchors.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &LoadedAnchor> {
		self.anchors.iter()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn catalog_has_46_unique_entries() {
		let defs = definitions();
		assert_eq!(defs.len(), 46);
		let names: HashSet<String> = defs.iter().map(|d| d.key.to_string()).collect();
		assert_eq!(names.len(), 46);
	}

	#[test]
	fn file_stems_follow_the_asset_names() {
		let stem = |key: AnchorKey| key.to_string();
		assert_eq!(stem(AnchorKey::AllCategoriesClosed { variant: 2 }), "all_categories_closed_2");
		assert_eq!(
			stem(AnchorKey::CategoryHeader {
				category: Category::AreaTasks,
				state: CategoryState::Expanded,
				variant: 3,
			}),
			"area_tasks_category_expanded_3"
		);
		assert_eq!(
			stem(AnchorKey::CategoryHeader {
				category: Category::Completionist,
				state: CategoryState::Collapsed,
				variant: 2,
			}),
			"completionist_category_selected"
		);
		assert_eq!(
			stem(AnchorKey::Preference {
				preference: DisplayPreference::ListMode,
				checked: false,
			}),
			"list_mode_unchecked"
		);
	}

	#[test]
	fn only_third_expanded_skins_prefer_the_generic_marker() {
		let flagged: Vec<String> = definitions()
			.iter()
			.filter(|d| d.prefers_generic_highlight())
			.map(|d| d.key.to_string())
			.collect();
		assert_eq!(flagged.len(), 6);
		assert!(flagged.iter().all(|k| k.ends_with("_expanded_3")));
	}

	#[test]
	fn missing_folder_is_an_error() {
		assert!(AnchorCatalog::load_dir("/definitely/not/here").is_err());
	}
}
