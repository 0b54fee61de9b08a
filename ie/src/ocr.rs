//! OCR wrapper.
//!
//! The project relies on `ocr-rs` (Rust PaddleOCR bindings) to turn a window
//! capture into text fragments. Game UI text is often drawn over gradients, so
//! a binarized candidate is tried whenever the raw capture reads poorly.

use std::path::Path;

use anyhow::{Context, Result};

use crate::{Image, OwnedImage};

/// One recognized text box, in pixels of the view that was read.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

pub struct Ocr {
    engine: ocr_rs::OcrEngine,
}

impl Ocr {
    /// Initialize the OCR engine with the given model paths.
    pub fn try_new(
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charsset: impl AsRef<Path>,
    ) -> Result<Self> {
        let thread_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let engine = ocr_rs::OcrEngine::new(
            detection,
            recognition,
            charsset,
            Some(ocr_rs::OcrEngineConfig {
                backend: ocr_rs::Backend::CPU,
                thread_count,
                precision_mode: ocr_rs::PrecisionMode::High,
                enable_parallel: thread_count > 1,
                min_result_confidence: 0.5,
                ..Default::default()
            }),
        )
        .context("failed to initialize OCR engine")?;

        Ok(Self { engine })
    }

    /// Recognize every text line in an RGB view, one fragment per detected box.
    pub fn get_lines(&self, image: Image) -> Vec<TextFragment> {
        let input = ocr_rs::preprocess::rgb_to_image(&image.get_bytes(), image.width(), image.height());

        match self.engine.recognize(&input) {
            Ok(results) => results
                .into_iter()
                .filter_map(|v| {
                    let text = v.text.trim();
                    (!text.is_empty()).then(|| TextFragment {
                        text: text.to_string(),
                        x: v.bbox.rect.left(),
                        y: v.bbox.rect.top(),
                        width: v.bbox.rect.width(),
                        height: v.bbox.rect.height(),
                        confidence: v.confidence,
                    })
                })
                .collect(),
            Err(err) => {
                tracing::debug!(error = %err, "ocr pass failed");
                Vec::new()
            }
        }
    }

    /// Recognize lines, retrying on an Otsu-binarized copy when the raw pass reads little.
    ///
    /// The candidate with the higher plausibility score wins.
    pub fn read_fragments(&self, image: Image) -> Vec<TextFragment> {
        use imageproc::contrast::{ThresholdType, equalize_histogram, otsu_level, threshold};

        let raw = self.get_lines(image);
        if score_lines(&raw) >= MIN_PLAUSIBLE_SCORE {
            return raw;
        }

        let binarized = {
            let gray = equalize_histogram(&image.to_owned_image().to_gray_image());
            let level = otsu_level(&gray);
            OwnedImage::from_gray_as_rgb(&ensure_dark_text_on_light(threshold(
                &gray,
                level,
                ThresholdType::Binary,
            )))
        };
        let retry = self.get_lines(binarized.as_image());

        if score_lines(&retry) > score_lines(&raw) { retry } else { raw }
    }
}

const MIN_PLAUSIBLE_SCORE: i64 = 24;

fn ensure_dark_text_on_light(mut bin: image::GrayImage) -> image::GrayImage {
    let white = bin.pixels().filter(|p| p.0[0] > 0).count();
    let black = (bin.width() * bin.height()) as usize - white;
    if black > white {
        for p in bin.pixels_mut() {
            p.0[0] = 255u8.saturating_sub(p.0[0]);
        }
    }
    bin
}

/// Prefer output with more alphanumerics (less noise).
fn score_lines(lines: &[TextFragment]) -> i64 {
    lines
        .iter()
        .flat_map(|line| line.text.chars())
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                3
            } else if ch.is_whitespace() {
                0
            } else {
                1
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            confidence: 0.9,
        }
    }

    #[test]
    fn alphanumerics_outscore_noise() {
        let clean = vec![fragment("Achievements")];
        let noisy = vec![fragment("~~|;;'.,")];
        assert!(score_lines(&clean) > score_lines(&noisy));
        assert_eq!(score_lines(&[]), 0);
    }
}
