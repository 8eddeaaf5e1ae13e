// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, upscale, linear intensity scaling,
// polarity inversion and PNG encoding. Operates on in-memory images using the
// `image` crate.

use glyphgate_core::error::GlyphgateError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let variant = ImageProcessor::from_bytes(&upload)?
///     .upscale(3.0)
///     .scale_intensity(3.0, 50.0)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path, normalised to three-channel RGB.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, GlyphgateError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            GlyphgateError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self::from_dynamic(img).into_rgb())
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.), normalised
    /// to three-channel RGB.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, GlyphgateError> {
        let img = image::load_from_memory(data).map_err(|err| {
            GlyphgateError::ImageError(format!("failed to decode image: {}", err))
        })?;
        if img.width() == 0 || img.height() == 0 {
            return Err(GlyphgateError::ImageError("image has no pixels".into()));
        }
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self::from_dynamic(img).into_rgb())
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Drop alpha and any exotic channel layout, leaving 8-bit RGB.
    pub fn into_rgb(self) -> Self {
        match self.image {
            DynamicImage::ImageRgb8(_) => self,
            other => Self {
                image: DynamicImage::ImageRgb8(other.to_rgb8()),
            },
        }
    }

    /// Scale both sides by `factor` using Catmull-Rom (bicubic) filtering.
    #[instrument(skip(self), fields(factor))]
    pub fn upscale(self, factor: f32) -> Self {
        let new_w = ((self.image.width() as f32 * factor).round() as u32).max(1);
        let new_h = ((self.image.height() as f32 * factor).round() as u32).max(1);
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            new_w,
            new_h,
            "Upscaling image"
        );
        Self {
            image: self.image.resize_exact(new_w, new_h, FilterType::CatmullRom),
        }
    }

    /// Linear intensity transform `|alpha · v + beta|`, saturated to 0..=255
    /// per channel. `alpha > 1` stretches contrast; `beta > 0` lifts shadows.
    #[instrument(skip(self), fields(alpha, beta))]
    pub fn scale_intensity(self, alpha: f32, beta: f32) -> Self {
        let rgb = self.image.to_rgb8();
        let adjust = |channel: u8| -> u8 { (alpha * channel as f32 + beta).abs().round().min(255.0) as u8 };

        let scaled = RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
            Rgb([adjust(r), adjust(g), adjust(b)])
        });
        Self {
            image: DynamicImage::ImageRgb8(scaled),
        }
    }

    /// Invert polarity so light-on-dark text becomes dark-on-light.
    pub fn invert(mut self) -> Self {
        self.image.invert();
        self
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, GlyphgateError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| GlyphgateError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbaImage};

    #[test]
    fn upscale_multiplies_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([10, 20, 30])));
        let up = ImageProcessor::from_dynamic(img).upscale(3.0);
        assert_eq!((up.width(), up.height()), (120, 60));
    }

    #[test]
    fn scale_intensity_saturates() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([10, 100, 200])));
        let out = ImageProcessor::from_dynamic(img)
            .scale_intensity(3.0, 50.0)
            .into_dynamic()
            .to_rgb8();
        assert_eq!(*out.get_pixel(0, 0), Rgb([80, 255, 255]));
    }

    #[test]
    fn invert_flips_polarity() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([20])));
        let out = ImageProcessor::from_dynamic(img).invert().into_dynamic().to_luma8();
        assert_eq!(out.get_pixel(1, 1).0[0], 235);
    }

    #[test]
    fn rgba_is_normalised_to_rgb() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 4])));
        let rgb = ImageProcessor::from_dynamic(img).into_rgb();
        assert!(matches!(rgb.as_dynamic(), DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn png_round_trip_through_bytes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 7, Rgb([9, 9, 9])));
        let bytes = ImageProcessor::from_dynamic(img).to_png_bytes().unwrap();
        let decoded = ImageProcessor::from_bytes(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 7));
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        let err = ImageProcessor::from_bytes(b"not an image").err().unwrap();
        assert!(matches!(err, GlyphgateError::ImageError(_)));
    }
}
