use std::fmt;

/// One of the primary achievement categories shown in the category rail.
///
/// Variants are declared in rail order (top to bottom), so `Ord` follows the
/// on-screen layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize, serde::Serialize)]
pub enum Category {
	#[serde(rename = "skills")]
	Skills,
	#[serde(rename = "exploration")]
	Exploration,
	#[serde(rename = "area tasks")]
	AreaTasks,
	#[serde(rename = "combat")]
	Combat,
	#[serde(rename = "lore")]
	Lore,
	#[serde(rename = "activities")]
	Activities,
	#[serde(rename = "completionist")]
	Completionist,
	#[serde(rename = "feats")]
	Feats,
}

impl Category {
	pub const ALL: [Category; 8] = [
		Self::Skills,
		Self::Exploration,
		Self::AreaTasks,
		Self::Combat,
		Self::Lore,
		Self::Activities,
		Self::Completionist,
		Self::Feats,
	];

	/// Display name, as printed on the rail header.
	pub fn name(self) -> &'static str {
		match self {
			Self::Skills => "skills",
			Self::Exploration => "exploration",
			Self::AreaTasks => "area tasks",
			Self::Combat => "combat",
			Self::Lore => "lore",
			Self::Activities => "activities",
			Self::Completionist => "completionist",
			Self::Feats => "feats",
		}
	}

	/// File-name friendly key (`area_tasks`).
	pub fn key(self) -> &'static str {
		match self {
			Self::AreaTasks => "area_tasks",
			other => other.name(),
		}
	}

	/// Completionist has no sections to collapse; it never counts as expanded.
	pub fn is_expandable(self) -> bool {
		self != Self::Completionist
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn serde_uses_display_names() {
		let json = serde_json::to_string(&Category::AreaTasks).unwrap();
		assert_eq!(json, "\"area tasks\"");
		let back: Category = serde_json::from_str("\"feats\"").unwrap();
		assert_eq!(back, Category::Feats);
	}

	#[test]
	fn rail_order_matches_ord() {
		let mut sorted = Category::ALL;
		sorted.sort();
		assert_eq!(sorted, Category::ALL);
		assert_eq!(Category::AreaTasks.key(), "area_tasks");
	}
}
