//! Sub-image search.
//!
//! A `Template` is a reference snapshot of a UI control (usually a PNG with
//! transparent background). `find_template` slides it over a capture and
//! reports every position whose masked average deviation stays under the
//! given threshold.

use anyhow::Result;

use crate::{Color, Image, OwnedImage, OwnedMask};

/// Alpha at or above which a template pixel takes part in the comparison.
const ALPHA_THRESHOLD: u8 = 128;

/// Max deviation allowed on the probe pixel before the full comparison runs.
const PROBE_TOLERANCE: f32 = 8.0;

/// One match position (top-left corner, relative to the searched view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Hit {
	pub x: u32,
	pub y: u32,
}

#[derive(Clone, Debug)]
pub struct Template {
	image: OwnedImage,
	mask: OwnedMask,
	opaque: usize,
	probe: Option<(u32, u32, Color)>,
}

impl Template {
	/// Decode a PNG snapshot; transparent pixels are ignored during search.
	pub fn from_png(bytes: &[u8]) -> Result<Self> {
		let (image, mask) = OwnedImage::from_png_mask(bytes, ALPHA_THRESHOLD)?;
		Ok(Self::with_mask(image, mask))
	}

	/// A fully opaque template.
	pub fn from_image(image: OwnedImage) -> Self {
		let mask = OwnedMask::opaque((image.width() * image.height()) as usize);
		Self::with_mask(image, mask)
	}

	fn with_mask(image: OwnedImage, mask: OwnedMask) -> Self {
		let view = image.as_image();
		let mut opaque = 0;
		let mut probe = None;
		for i in 0..(image.width() * image.height()) as usize {
			if !mask.is_set(i) {
				continue;
			}
			opaque += 1;
			if probe.is_none() {
				let (x, y) = (i as u32 % image.width(), i as u32 / image.width());
				probe = Some((x, y, view.at(x, y)));
			}
		}

		Self {
			image,
			mask,
			opaque,
			probe,
		}
	}

	#[inline]
	pub fn width(&self) -> u32 {
		self.image.width()
	}

	#[inline]
	pub fn height(&self) -> u32 {
		self.image.height()
	}

	/// Masked average deviation at `(x, y)`, or `None` once it is certain to exceed `limit`.
	fn deviation_at(&self, haystack: Image, x: u32, y: u32, limit: f32) -> Option<f32> {
		let budget = limit * self.opaque as f32;
		let needle = self.image.as_image();
		let mut total = 0.0f32;
		let mut i = 0usize;
		for ty in 0..self.height() {
			for tx in 0..self.width() {
				let used = self.mask.is_set(i);
				i += 1;
				if !used {
					continue;
				}
				total += haystack.at(x + tx, y + ty).deviation(needle.at(tx, ty));
				if total > budget {
					return None;
				}
			}
		}
		Some(total / self.opaque as f32)
	}
}

/// Find up to `max_hits` non-overlapping positions of `template` inside `haystack`.
///
/// Hits are reported in row-major scan order. A template without any opaque
/// pixel, or one larger than the haystack, never matches.
pub fn find_template(haystack: Image, template: &Template, max_deviation: f32, max_hits: usize) -> Vec<Hit> {
	let mut hits: Vec<Hit> = Vec::new();
	let Some((px, py, probe)) = template.probe else {
		return hits;
	};
	let (tw, th) = (template.width(), template.height());
	if tw > haystack.width() || th > haystack.height() || max_hits == 0 {
		return hits;
	}

	for y in 0..=(haystack.height() - th) {
		for x in 0..=(haystack.width() - tw) {
			if haystack.at(x + px, y + py).deviation(probe) > PROBE_TOLERANCE {
				continue;
			}
			let overlaps = hits
				.iter()
				.any(|h| x < h.x + tw && h.x < x + tw && y < h.y + th && h.y < y + th);
			if overlaps {
				continue;
			}
			if template.deviation_at(haystack, x, y, max_deviation).is_some() {
				hits.push(Hit { x, y });
				if hits.len() >= max_hits {
					return hits;
				}
			}
		}
	}

	hits
}
