// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region sampling — crop a detected text box out of the source image and
// measure the cheap appearance signals the font discriminator compares.

use glyphgate_core::geometry::PixelRect;
use image::{GrayImage, Luma, RgbImage, imageops};

use crate::variants::enhance::{otsu_threshold, rgb_to_hsv};

/// Cropped pixels of one text region plus their appearance metrics.
#[derive(Debug, Clone)]
pub struct RegionSample {
    /// The rectangle actually cropped, clamped to the source.
    pub rect: PixelRect,
    pub pixels: RgbImage,
    /// Mean luma in `[0, 1]`.
    pub brightness: f32,
    /// Mean HSV saturation in `[0, 1]`.
    pub saturation: f32,
    /// Share of crop pixels on the minority side of an Otsu split, in
    /// `[0, 0.5]`. Thick or bold strokes push this up.
    pub density: f32,
}

/// Crop `rect` (source coordinates) from `source` and measure it.
///
/// The rectangle is clamped into the image first, so any box, even one far
/// outside the frame, yields a non-empty sample.
pub fn sample_region(source: &RgbImage, rect: PixelRect) -> RegionSample {
    let rect = rect.clamp_to(source.width(), source.height());
    let pixels = imageops::crop_imm(source, rect.x_min, rect.y_min, rect.width(), rect.height())
        .to_image();

    let total = (pixels.width() as u64 * pixels.height() as u64).max(1) as f64;
    let mut luma_sum = 0.0f64;
    let mut saturation_sum = 0.0f64;
    let gray = GrayImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let pixel = *pixels.get_pixel(x, y);
        let [r, g, b] = pixel.0;
        let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        luma_sum += luma;
        saturation_sum += rgb_to_hsv(pixel).1 as f64;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    });

    RegionSample {
        rect,
        brightness: (luma_sum / total / 255.0) as f32,
        saturation: (saturation_sum / total) as f32,
        density: stroke_density(&gray),
        pixels,
    }
}

/// Minority-class fraction after Otsu binarization. A uniform patch scores 0.
pub fn stroke_density(gray: &GrayImage) -> f32 {
    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let threshold = otsu_threshold(gray);
    let dark = gray.pixels().filter(|p| p.0[0] <= threshold).count() as u64;
    let minority = dark.min(total - dark);
    minority as f32 / total as f32
}
