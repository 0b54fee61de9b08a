use std::path::Path;

use anyhow::{Context, Result, ensure};

use crate::Category;

/// A primary category together with the section names it reveals when expanded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct CategoryEntry {
	pub name: Category,
	#[serde(default)]
	pub subcategories: Vec<String>,
}

/// Ordered category layout the guide expects to find on screen.
///
/// Loaded once by the application and treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct CategorySchema {
	pub categories: Vec<CategoryEntry>,
}

impl CategorySchema {
	pub fn from_json(json: &str) -> Result<Self> {
		let schema: Self = serde_json::from_str(json).context("parse category schema")?;
		ensure!(!schema.categories.is_empty(), "category schema lists no categories");
		Ok(schema)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let json = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
		Self::from_json(&json).with_context(|| format!("load {:?}", path))
	}

	/// The layout shipped with the game client at the time of writing.
	pub fn bundled() -> Self {
		let entry = |name: Category, subcategories: &[&str]| CategoryEntry {
			name,
			subcategories: subcategories.iter().map(|s| s.to_string()).collect(),
		};

		Self {
			categories: vec![
				entry(Category::Skills, &[
					"Agility", "Archaeology", "Attack", "Constitution", "Construction", "Cooking",
					"Crafting", "Defence", "Divination", "Dungeoneering", "Farming", "Firemaking",
					"Fishing", "Fletching", "Herblore", "Hunter", "Invention", "Magic", "Mining",
					"Necromancy", "Prayer", "Ranged", "Runecrafting", "Slayer", "Smithing",
					"Strength", "Summoning", "Thieving", "Woodcutting",
				]),
				entry(Category::Exploration, &[
					"Anachronia", "Asgarnia", "Desert", "Fremennik", "Kandarin", "Karamja",
					"Menaphos", "Misthalin", "Morytania", "Tirannwn", "Wilderness",
				]),
				entry(Category::AreaTasks, &[
					"Ardougne", "Daemonheim", "Falador", "Lumbridge", "Seers' Village",
					"Varrock", "Western Provinces", "Wilderness Tasks",
				]),
				entry(Category::Combat, &[
					"Bosses", "Melee", "Ranged Combat", "Magic Combat", "Necromancy Combat",
					"Slayer Masters", "Dungeons",
				]),
				entry(Category::Lore, &["Quests", "Miniquests", "Lore Books", "Sagas"]),
				entry(Category::Activities, &[
					"Minigames", "Distractions and Diversions", "Clue Scrolls",
					"Player-owned Ports", "Events",
				]),
				entry(Category::Completionist, &["Completionist Cape", "Master Quest Cape", "Trimmed"]),
				entry(Category::Feats, &["Skilling Feats", "Combat Feats", "Challenges"]),
			],
		}
	}

	pub fn len(&self) -> usize {
		self.categories.len()
	}

	pub fn is_empty(&self) -> bool {
		self.categories.is_empty()
	}

	pub fn contains(&self, category: Category) -> bool {
		self.categories.iter().any(|c| c.name == category)
	}

	pub fn names(&self) -> impl Iterator<Item = Category> + '_ {
		self.categories.iter().map(|c| c.name)
	}
}
