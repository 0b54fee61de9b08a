//! Value types flowing through the pipeline: frames, fragments, signals, snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use data::Category;

/// Confidence assumed for a fragment whose recognizer reports none.
pub const DEFAULT_TOKEN_CONFIDENCE: f32 = 0.75;

/// Axis-aligned rectangle in frame-local pixels. Width and height are never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(from = "RawRect")]
pub struct Rect {
	pub x: i32,
	pub y: i32,
	pub width: u32,
	pub height: u32,
}

impl Rect {
	pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
		Self {
			x,
			y,
			width: width.max(1),
			height: height.max(1),
		}
	}

	/// Degenerate placeholder used when nothing better is known.
	pub const UNIT: Self = Self {
		x: 0,
		y: 0,
		width: 1,
		height: 1,
	};

	#[inline]
	pub fn right(&self) -> i64 {
		self.x as i64 + self.width as i64
	}

	#[inline]
	pub fn bottom(&self) -> i64 {
		self.y as i64 + self.height as i64
	}

	/// Smallest rectangle covering every input, `None` for an empty input.
	pub fn union<I: IntoIterator<Item = Rect>>(rects: I) -> Option<Rect> {
		let mut iter = rects.into_iter();
		let first = iter.next()?;
		let (mut x1, mut y1, mut x2, mut y2) = (first.x as i64, first.y as i64, first.right(), first.bottom());
		for r in iter {
			x1 = x1.min(r.x as i64);
			y1 = y1.min(r.y as i64);
			x2 = x2.max(r.right());
			y2 = y2.max(r.bottom());
		}
		Some(Rect::new(
			x1 as i32,
			y1 as i32,
			(x2 - x1).clamp(1, u32::MAX as i64) as u32,
			(y2 - y1).clamp(1, u32::MAX as i64) as u32,
		))
	}
}

/// Wire form of [`Rect`]; deserialized values go through [`Rect::new`].
#[derive(serde::Deserialize)]
struct RawRect {
	x: i32,
	y: i32,
	width: u32,
	height: u32,
}

impl From<RawRect> for Rect {
	fn from(raw: RawRect) -> Self {
		Self::new(raw.x, raw.y, raw.width, raw.height)
	}
}

impl fmt::Display for Rect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}:{}", self.x, self.y, self.width, self.height)
	}
}

/// One recognized piece of on-screen text.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Token {
	pub text: String,
	#[serde(default)]
	pub rect: Option<Rect>,
	#[serde(default)]
	pub confidence: Option<f32>,
}

impl Token {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			rect: None,
			confidence: None,
		}
	}

	pub fn with_rect(mut self, rect: Rect) -> Self {
		self.rect = Some(rect);
		self
	}

	pub fn with_confidence(mut self, confidence: f32) -> Self {
		self.confidence = Some(confidence.clamp(0.0, 1.0));
		self
	}

	pub fn confidence_or(&self, default: f32) -> f32 {
		self.confidence.unwrap_or(default)
	}
}

/// Fused location of one UI element.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DetectedTarget {
	pub rect: Rect,
	pub confidence: f32,
}

/// One captured observation. Immutable once the provider hands it over.
#[derive(Debug, Clone)]
pub struct RawFrame {
	pub tokens: Vec<Token>,
	/// Pixels, when the provider captured any. Tier A needs them.
	pub image: Option<Arc<ie::OwnedImage>>,
	/// Opaque handle for backends that search the capture themselves.
	pub handle: Option<u64>,
	pub width: u32,
	pub height: u32,
	pub captured_at: Instant,
	/// Injected signals; they override every detector.
	pub precomputed: Option<Signals>,
}

impl RawFrame {
	pub fn from_tokens(tokens: Vec<Token>) -> Self {
		Self {
			tokens,
			image: None,
			handle: None,
			width: 0,
			height: 0,
			captured_at: Instant::now(),
			precomputed: None,
		}
	}

	pub fn with_image(mut self, image: ie::OwnedImage) -> Self {
		self.width = image.width();
		self.height = image.height();
		self.image = Some(Arc::new(image));
		self
	}

	pub fn with_precomputed(mut self, signals: Signals) -> Self {
		self.precomputed = Some(signals);
		self
	}
}

/// Per-stage timings in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Telemetry {
	pub capture_ms: Option<f64>,
	pub finder_ms: Option<f64>,
	pub recognition_ms: Option<f64>,
	pub fsm_ms: Option<f64>,
	pub total_ms: Option<f64>,
}

impl Telemetry {
	fn or(self, lower: Telemetry) -> Telemetry {
		Telemetry {
			capture_ms: self.capture_ms.or(lower.capture_ms),
			finder_ms: self.finder_ms.or(lower.finder_ms),
			recognition_ms: self.recognition_ms.or(lower.recognition_ms),
			fsm_ms: self.fsm_ms.or(lower.fsm_ms),
			total_ms: self.total_ms.or(lower.total_ms),
		}
	}
}

/// Which category (if any) currently shows its sections.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ExpandedCategory {
	/// `None` means "known: nothing is expanded".
	pub category: Option<Category>,
	#[serde(default)]
	pub confidence: Option<f32>,
}

impl ExpandedCategory {
	pub const NONE: Self = Self {
		category: None,
		confidence: None,
	};
}

/// Everything the detectors could say about one frame.
///
/// Every field is optional: `None` means "unknown", which the workflow keeps
/// distinct from a known `Some(false)`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Signals {
	pub has_options_menu: Option<bool>,
	pub has_hero_window: Option<bool>,
	pub matched_anchors: Option<Vec<String>>,

	pub options_menu_target: Option<DetectedTarget>,
	pub hero_button_target: Option<DetectedTarget>,
	pub hero_window_target: Option<DetectedTarget>,
	pub top_tab_target: Option<DetectedTarget>,
	pub subtab_target: Option<DetectedTarget>,
	pub top_tab_selected: Option<bool>,
	pub subtab_selected: Option<bool>,

	pub show_locked: Option<bool>,
	pub show_completed: Option<bool>,
	pub list_mode: Option<bool>,
	pub show_locked_target: Option<DetectedTarget>,
	pub show_completed_target: Option<DetectedTarget>,
	pub list_mode_target: Option<DetectedTarget>,

	pub category_rail: Option<Rect>,
	pub category_headers: Option<BTreeMap<Category, Rect>>,
	/// Generic "an expanded section is here" marker.
	pub expanded_marker: Option<Rect>,
	/// Set when an anchor variant asks for the generic marker over a precise header.
	pub prefer_generic_highlight: Option<bool>,
	pub expanded_category: Option<ExpandedCategory>,
	pub visible_categories: Option<BTreeSet<Category>>,

	pub telemetry: Telemetry,
}

impl Signals {
	/// Fill every field `self` leaves unknown from `lower`; known values in `self` win.
	pub fn or(self, lower: Signals) -> Signals {
		Signals {
			has_options_menu: self.has_options_menu.or(lower.has_options_menu),
			has_hero_window: self.has_hero_window.or(lower.has_hero_window),
			matched_anchors: self.matched_anchors.or(lower.matched_anchors),
			options_menu_target: self.options_menu_target.or(lower.options_menu_target),
			hero_button_target: self.hero_button_target.or(lower.hero_button_target),
			hero_window_target: self.hero_window_target.or(lower.hero_window_target),
			top_tab_target: self.top_tab_target.or(lower.top_tab_target),
			subtab_target: self.subtab_target.or(lower.subtab_target),
			top_tab_selected: self.top_tab_selected.or(lower.top_tab_selected),
			subtab_selected: self.subtab_selected.or(lower.subtab_selected),
			show_locked: self.show_locked.or(lower.show_locked),
			show_completed: self.show_completed.or(lower.show_completed),
			list_mode: self.list_mode.or(lower.list_mode),
			show_locked_target: self.show_locked_target.or(lower.show_locked_target),
			show_completed_target: self.show_completed_target.or(lower.show_completed_target),
			list_mode_target: self.list_mode_target.or(lower.list_mode_target),
			category_rail: self.category_rail.or(lower.category_rail),
			category_headers: self.category_headers.or(lower.category_headers),
			expanded_marker: self.expanded_marker.or(lower.expanded_marker),
			prefer_generic_highlight: self.prefer_generic_highlight.or(lower.prefer_generic_highlight),
			expanded_category: self.expanded_category.or(lower.expanded_category),
			visible_categories: self.visible_categories.or(lower.visible_categories),
			telemetry: self.telemetry.or(lower.telemetry),
		}
	}
}

/// What the workflow sees for one tick. Rebuilt every tick, never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSnapshot {
	pub tokens: Vec<Token>,
	pub tick: Option<u64>,
	pub captured_at: Option<Instant>,
	pub signals: Signals,
}

impl FrameSnapshot {
	/// Snapshot carrying only signals; handy for driving the workflow directly.
	pub fn from_signals(signals: Signals) -> Self {
		Self {
			signals,
			..Self::default()
		}
	}
}

/// Gates of the setup workflow, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
	WaitOptionsMenu,
	WaitHeroWindow,
	WaitAchievementsTopTab,
	WaitAchievementsSubtab,
	WaitDisplayPreferences,
	WaitCategoryBaseline,
	ReadyForGuidedScan,
}

impl fmt::Display for BootstrapState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::WaitOptionsMenu => "wait_options_menu",
			Self::WaitHeroWindow => "wait_hero_window",
			Self::WaitAchievementsTopTab => "wait_achievements_top_tab",
			Self::WaitAchievementsSubtab => "wait_achievements_subtab",
			Self::WaitDisplayPreferences => "wait_display_preferences",
			Self::WaitCategoryBaseline => "wait_category_baseline",
			Self::ReadyForGuidedScan => "ready_for_guided_scan",
		})
	}
}

/// The three list filters the scan depends on, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPreference {
	ShowLocked,
	ShowCompleted,
	ListMode,
}

impl DisplayPreference {
	pub const ALL: [DisplayPreference; 3] = [Self::ShowLocked, Self::ShowCompleted, Self::ListMode];

	/// Required checkbox state.
	pub fn target(self) -> bool {
		matches!(self, Self::ShowLocked)
	}

	pub fn key(self) -> &'static str {
		match self {
			Self::ShowLocked => "show_locked",
			Self::ShowCompleted => "show_completed",
			Self::ListMode => "list_mode",
		}
	}

	/// Current state as carried by `signals`.
	pub fn current(self, signals: &Signals) -> Option<bool> {
		match self {
			Self::ShowLocked => signals.show_locked,
			Self::ShowCompleted => signals.show_completed,
			Self::ListMode => signals.list_mode,
		}
	}

	pub fn target_rect(self, signals: &Signals) -> Option<Rect> {
		match self {
			Self::ShowLocked => signals.show_locked_target,
			Self::ShowCompleted => signals.show_completed_target,
			Self::ListMode => signals.list_mode_target,
		}
		.map(|t| t.rect)
	}
}

impl fmt::Display for DisplayPreference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

/// The single user-facing output of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GuideInstruction {
	pub message: String,
	pub highlight: Option<Rect>,
}

impl GuideInstruction {
	pub fn new(message: impl Into<String>, highlight: Option<Rect>) -> Self {
		Self {
			message: message.into(),
			highlight,
		}
	}
}
