//! Pixel containers shared by capture, anchor loading and sub-image search.
//!
//! Captures are stored once as an `OwnedImage` and then inspected through
//! cheap borrowed views (`Image<'a>`), so cropping never copies pixels.

use anyhow::{Context, Result};

/// Packed row-major bitset; bit `i` is set when pixel `i` is opaque.
#[derive(Clone, Debug)]
pub struct OwnedMask(pub Vec<u8>);

impl OwnedMask {
    /// A mask with every one of `len` pixels opaque.
    pub fn opaque(len: usize) -> Self {
        Self(vec![0xff; len / 8 + 1])
    }

    #[inline]
    pub fn is_set(&self, i: usize) -> bool {
        (self.0[i / 8] >> (i % 8)) & 1 == 1
    }
}

/// Owned RGB image (no alpha).
#[derive(Clone, Debug)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Build an image from tightly packed pixels, row-major.
    ///
    /// Returns `None` when `data` does not hold exactly `width * height` pixels.
    pub fn from_pixels(width: u32, height: u32, data: Vec<Color>) -> Option<Self> {
        (data.len() == (width as usize) * (height as usize)).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Build an `OwnedImage` from RGBA bytes (alpha is discarded).
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = bytes.len() / width.max(1) / 4;
        let data = bytes
            .chunks_exact(4)
            .take(width * height)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    /// Decode an RGBA PNG into an `(OwnedImage, OwnedMask)` pair.
    ///
    /// Pixels whose alpha is below `alpha_threshold` are left out of the mask,
    /// which lets anchor snapshots ignore the background around a control.
    pub fn from_png_mask(bytes: &[u8], alpha_threshold: u8) -> Result<(Self, OwnedMask)> {
        let img = image::load_from_memory(bytes)
            .context("decode png (with alpha)")?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let mut data = Vec::with_capacity((width * height) as usize);
        let mut mask = vec![0u8; (width * height) as usize / 8 + 1];

        for (i, p) in img.pixels().enumerate() {
            let [r, g, b, a] = p.0;
            data.push(Color::new(r, g, b));
            if a >= alpha_threshold {
                mask[i / 8] |= 1 << (i % 8);
            }
        }

        Ok((
            Self {
                width,
                height,
                data,
            },
            OwnedMask(mask),
        ))
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resize to the given height, preserving aspect ratio.
    pub fn resize_h(&mut self, height: u32) -> Result<()> {
        use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images};

        let height = height.max(1);
        if self.height == height {
            return Ok(());
        }
        let width = ((self.width as u64 * height as u64) / self.height.max(1) as u64).max(1) as u32;

        let src = images::Image::from_vec_u8(self.width, self.height, self.to_rgb_bytes(), PixelType::U8x3)
            .context("wrap capture for resizing")?;
        let mut dst = images::Image::new(width, height, PixelType::U8x3);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
        Resizer::new()
            .resize(&src, &mut dst, &options)
            .context("resize capture")?;

        self.data = dst
            .into_vec()
            .chunks_exact(3)
            .map(|px| Color::new(px[0], px[1], px[2]))
            .collect();
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image(&self) -> Image<'_> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.data[(x + y * self.width) as usize].luma()])
        })
    }

    /// Create an RGB `OwnedImage` from a grayscale image (each pixel repeated into RGB).
    pub fn from_gray_as_rgb(gray: &image::GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let data = gray
            .pixels()
            .map(|p| Color::new(p.0[0], p.0[0], p.0[0]))
            .collect();
        Self { width, height, data }
    }

    fn to_rgb_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Pixel at view-relative coordinates.
    #[inline(always)]
    pub(crate) fn at(&self, x: u32, y: u32) -> Color {
        self.data[(self.x1 + x + (self.y1 + y) * self.true_width) as usize]
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in 0..self.height() {
            for x in 0..self.width() {
                data.push(self.at(x, y));
            }
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width() * self.height() * 3) as usize);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let clr = self.at(x, y);
                bytes.extend_from_slice(&[clr.r, clr.g, clr.b]);
            }
        }
        bytes
    }

    /// Create an arbitrary subimage (relative coordinates), clamped to this view.
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Deviation metric used for all pixel comparisons.
    ///
    /// 1.0 corresponds to an average channel difference of 5%; the cube makes
    /// small compression noise nearly free while real differences dominate.
    pub fn deviation(&self, other: Color) -> f32 {
        (((self.r as f32 - other.r as f32).abs() / 255.0 / 3.0
            + (self.g as f32 - other.g as f32).abs() / 255.0 / 3.0
            + (self.b as f32 - other.b as f32).abs() / 255.0 / 3.0)
            / 0.05)
            .powi(3)
    }

    /// Compute luma (grayscale intensity).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }
}
