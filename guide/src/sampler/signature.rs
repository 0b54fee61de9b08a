use std::fmt;

use crate::Token;

const FNV_OFFSET: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// Order-sensitive 32-bit content fingerprint of a frame's fragments.
///
/// Only a change hint: equal signatures do not prove equal frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSignature(pub u32);

impl FrameSignature {
	pub fn of_tokens(tokens: &[Token]) -> Self {
		let mut hash = FNV_OFFSET;
		let mut push = |value: &str| {
			for ch in value.chars() {
				hash ^= ch as u32;
				hash = hash.wrapping_mul(FNV_PRIME);
			}
		};
		for token in tokens {
			push(&token.text.to_lowercase());
			if let Some(rect) = token.rect {
				push(&rect.to_string());
			}
			push("\u{1f}");
		}
		Self(hash)
	}
}

impl fmt::Display for FrameSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:08x}", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Rect;

	#[test]
	fn case_is_ignored() {
		let a = FrameSignature::of_tokens(&[Token::new("Hero")]);
		let b = FrameSignature::of_tokens(&[Token::new("HERO")]);
		assert_eq!(a, b);
	}

	#[test]
	fn position_changes_the_signature() {
		let a = FrameSignature::of_tokens(&[Token::new("lore").with_rect(Rect::new(1, 2, 3, 4))]);
		let b = FrameSignature::of_tokens(&[Token::new("lore").with_rect(Rect::new(1, 2, 3, 5))]);
		assert_ne!(a, b);
	}

	#[test]
	fn order_changes_the_signature() {
		let hero = Token::new("hero").with_rect(Rect::new(10, 10, 40, 12));
		let lore = Token::new("lore").with_rect(Rect::new(10, 40, 40, 12));
		let a = FrameSignature::of_tokens(&[hero.clone(), lore.clone()]);
		let b = FrameSignature::of_tokens(&[lore, hero]);
		assert_ne!(a, b);
	}

	#[test]
	fn empty_frame_has_offset_basis() {
		assert_eq!(FrameSignature::of_tokens(&[]).to_string(), "811c9dc5");
	}
}
