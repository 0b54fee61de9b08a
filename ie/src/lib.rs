//! Image engine: pixel containers, sub-image search and OCR.

mod image;
pub use self::image::*;
mod ocr;
pub use ocr::{Ocr, TextFragment};
mod template;
pub use template::*;
