use anyhow::{Context, Result};
use guide::{RawFrame, Rect, Token};
use xcap::image::EncodableLayout;

pub fn find_window(app_name: &str) -> Option<xcap::Window> {
	let windows = xcap::Window::all().ok()?;
	windows
		.into_iter()
		.find(|window| window.app_name().ok().as_deref() == Some(app_name))
}

/// Fragment position and recognizer confidence carry over; boxes are in capture pixels.
fn fragment_token(fragment: ie::TextFragment) -> Token {
	let rect = Rect::new(fragment.x, fragment.y, fragment.width, fragment.height);
	Token::new(fragment.text).with_rect(rect).with_confidence(fragment.confidence)
}

/// Captures the game window and reads its text, one frame per call.
pub struct WindowCapture {
	app_name: String,
	max_height: Option<u32>,
	ocr: ie::Ocr,
}

impl WindowCapture {
	pub fn new(app_name: String, max_height: Option<u32>, ocr: ie::Ocr) -> Self {
		Self {
			app_name,
			max_height,
			ocr,
		}
	}

	fn capture_image(&self) -> Result<ie::OwnedImage> {
		let window = find_window(&self.app_name).with_context(|| format!("window {:?} not found", self.app_name))?;
		let img = window.capture_image().context("capture window")?;
		let mut image = ie::OwnedImage::from_rgba(img.width() as usize, img.as_bytes());
		if let Some(max) = self.max_height
			&& image.height() > max
		{
			image.resize_h(max).context("downscale capture")?;
		}
		Ok(image)
	}

	/// Pixels for the template detector, text fragments for the fallback.
	pub fn capture_frame(&self) -> Result<RawFrame> {
		let image = self.capture_image()?;
		let tokens: Vec<Token> = self
			.ocr
			.read_fragments(image.as_image())
			.into_iter()
			.map(fragment_token)
			.collect();
		tracing::trace!(tokens = tokens.len(), width = image.width(), height = image.height(), "captured");
		Ok(RawFrame::from_tokens(tokens).with_image(image))
	}
}
