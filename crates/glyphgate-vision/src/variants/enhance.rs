// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text enhancement primitives — adaptive and Otsu binarization, contrast-limited
// adaptive histogram equalization, morphology, sharpening, blurring and
// suppression of a dominant accent hue.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;
use tracing::{debug, instrument};

/// Enhances an image so faint, thin or coloured text stands out for a
/// recognizer.
///
/// Each method consumes `self` and returns the transformed enhancer, so steps
/// chain the same way as [`crate::ImageProcessor`].
pub struct TextEnhancer {
    image: DynamicImage,
}

/// A band of hue (degrees, circular) picked out as the dominant accent colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueBand {
    pub center: f32,
    pub half_width: f32,
    /// Share of all pixels inside the band.
    pub coverage: f32,
}

impl HueBand {
    pub fn contains(&self, hue: f32) -> bool {
        let diff = (hue - self.center).rem_euclid(360.0);
        diff.min(360.0 - diff) <= self.half_width
    }
}

impl TextEnhancer {
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Binarization ---------------------------------------------------------

    /// Adaptive thresholding against the local mean.
    ///
    /// For each pixel, the threshold is the mean intensity within a
    /// `block_radius` neighbourhood, minus a constant `c`. Pixels darker than
    /// the local threshold become black; others become white.
    #[instrument(skip(self), fields(block_radius, c))]
    pub fn binarize(self, block_radius: u32, c: i32) -> Self {
        let gray = self.image.to_luma8();
        let (width, height) = gray.dimensions();
        let integral = compute_integral_image(&gray);

        let output = GrayImage::from_fn(width, height, |x, y| {
            let local_mean = region_mean(&integral, width, height, x, y, block_radius);
            let threshold = (local_mean.round() as i32 - c).clamp(0, 255) as u8;
            let pixel_val = gray.get_pixel(x, y).0[0];
            Luma([if pixel_val < threshold { 0u8 } else { 255u8 }])
        });

        Self {
            image: DynamicImage::ImageLuma8(output),
        }
    }

    /// Global binarization with the threshold chosen by Otsu's method.
    #[instrument(skip(self))]
    pub fn binarize_otsu(self) -> Self {
        let gray = self.image.to_luma8();
        let threshold = otsu_threshold(&gray);
        debug!(threshold, "Otsu threshold computed");

        let output = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let val = gray.get_pixel(x, y).0[0];
            Luma([if val <= threshold { 0u8 } else { 255u8 }])
        });

        Self {
            image: DynamicImage::ImageLuma8(output),
        }
    }

    // -- Contrast -------------------------------------------------------------

    /// Contrast-limited adaptive histogram equalization on the luma channel.
    ///
    /// The image is split into a `tiles × tiles` grid; each tile's histogram is
    /// clipped at `clip_limit` times the uniform bin height, the excess spread
    /// evenly, and the resulting mappings bilinearly blended between tile
    /// centres.
    #[instrument(skip(self), fields(clip_limit, tiles))]
    pub fn equalize_adaptive(self, clip_limit: f32, tiles: u32) -> Self {
        let gray = self.image.to_luma8();
        Self {
            image: DynamicImage::ImageLuma8(clahe(&gray, clip_limit, tiles)),
        }
    }

    /// Unsharp masking on the colour image.
    pub fn unsharpen(self, sigma: f32, threshold: i32) -> Self {
        Self {
            image: self.image.unsharpen(sigma, threshold),
        }
    }

    /// Gaussian blur on the colour image; softens JPEG ringing and halftone dots.
    pub fn blur(self, sigma: f32) -> Self {
        let rgb = self.image.to_rgb8();
        Self {
            image: DynamicImage::ImageRgb8(gaussian_blur_f32(&rgb, sigma)),
        }
    }

    // -- Morphology -----------------------------------------------------------

    /// Grayscale closing (dilate then erode): bridges broken thin strokes.
    pub fn close(self, radius: u8) -> Self {
        let gray = self.image.to_luma8();
        Self {
            image: DynamicImage::ImageLuma8(morphology::close(&gray, Norm::LInf, radius)),
        }
    }

    /// Grayscale opening (erode then dilate): removes specks smaller than the
    /// structuring element.
    pub fn open(self, radius: u8) -> Self {
        let gray = self.image.to_luma8();
        Self {
            image: DynamicImage::ImageLuma8(morphology::open(&gray, Norm::LInf, radius)),
        }
    }

    // -- Accent colour --------------------------------------------------------

    /// Paint every saturated pixel whose hue falls inside `band` white, so dark
    /// text printed over a coloured banner becomes the strongest edge.
    #[instrument(skip(self), fields(center = band.center, half_width = band.half_width))]
    pub fn suppress_hue(self, band: HueBand, min_saturation: f32, min_value: f32) -> Self {
        let mut rgb = self.image.to_rgb8();
        let mut replaced = 0u64;
        for pixel in rgb.pixels_mut() {
            let (hue, sat, val) = rgb_to_hsv(*pixel);
            if sat >= min_saturation && val >= min_value && band.contains(hue) {
                *pixel = Rgb([255, 255, 255]);
                replaced += 1;
            }
        }
        debug!(replaced, "Accent hue suppressed");
        Self {
            image: DynamicImage::ImageRgb8(rgb),
        }
    }
}

/// Find the hue that dominates the saturated pixels of `rgb`, if it covers at
/// least `min_fraction` of the whole image.
///
/// Hues are histogrammed into `bins` circular buckets; a bucket's weight
/// includes its two neighbours so a colour straddling a boundary still wins.
pub fn dominant_accent_hue(
    rgb: &RgbImage,
    min_saturation: f32,
    min_value: f32,
    min_fraction: f32,
    bins: u32,
) -> Option<HueBand> {
    let total = rgb.width() as u64 * rgb.height() as u64;
    if total == 0 || bins == 0 {
        return None;
    }
    let bins = bins as usize;
    let bin_width = 360.0 / bins as f32;

    let mut histogram = vec![0u64; bins];
    for pixel in rgb.pixels() {
        let (hue, sat, val) = rgb_to_hsv(*pixel);
        if sat >= min_saturation && val >= min_value {
            let idx = ((hue / bin_width) as usize).min(bins - 1);
            histogram[idx] += 1;
        }
    }

    let windowed = |i: usize| {
        histogram[(i + bins - 1) % bins] + histogram[i] + histogram[(i + 1) % bins]
    };
    let (best, weight) = (0..bins).map(|i| (i, windowed(i))).max_by_key(|&(_, w)| w)?;

    let coverage = weight as f32 / total as f32;
    debug!(best_bin = best, coverage, "Dominant hue measured");
    if weight == 0 || coverage < min_fraction {
        return None;
    }
    Some(HueBand {
        center: (best as f32 + 0.5) * bin_width,
        half_width: 1.5 * bin_width,
        coverage,
    })
}

/// Convert an RGB pixel to `(hue°, saturation, value)` with saturation and
/// value in `[0, 1]`.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> (f32, f32, f32) {
    let [r, g, b] = pixel.0.map(|c| c as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };
    (hue, saturation, max)
}

/// Compute the Otsu threshold for a grayscale image.
///
/// Finds the threshold value that maximises the between-class variance of the
/// dark and light pixel groups. Pixels `<= threshold` form the dark class.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes).
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value of the square of `radius` around (cx, cy), clamped to the
/// image, from a precomputed integral image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(img_width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

// -- CLAHE --------------------------------------------------------------------

fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }

    let tile_w = w.div_ceil(tiles.clamp(1, w));
    let tile_h = h.div_ceil(tiles.clamp(1, h));
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            luts.push(tile_lut(gray, x0, y0, x1, y1, clip_limit));
        }
    }

    // Position of a pixel in tile-centre coordinates, split into the lower
    // tile index and the blend weight toward the next tile.
    let locate = |p: u32, tile: u32, count: u32| -> (usize, usize, f32) {
        let f = ((p as f32 + 0.5) / tile as f32 - 0.5).max(0.0);
        let lo = (f.floor() as u32).min(count - 1);
        let hi = (lo + 1).min(count - 1);
        let weight = (f - lo as f32).clamp(0.0, 1.0);
        (lo as usize, hi as usize, weight)
    };

    let stride = tiles_x as usize;
    GrayImage::from_fn(w, h, |x, y| {
        let v = gray.get_pixel(x, y).0[0] as usize;
        let (x_lo, x_hi, ax) = locate(x, tile_w, tiles_x);
        let (y_lo, y_hi, ay) = locate(y, tile_h, tiles_y);

        let top = luts[y_lo * stride + x_lo][v] as f32 * (1.0 - ax)
            + luts[y_lo * stride + x_hi][v] as f32 * ax;
        let bottom = luts[y_hi * stride + x_lo][v] as f32 * (1.0 - ax)
            + luts[y_hi * stride + x_hi][v] as f32 * ax;
        Luma([(top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8])
    })
}

fn tile_lut(gray: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut histogram = [0u64; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }
    let count = (x1 - x0) as u64 * (y1 - y0) as u64;
    let mut lut = [0u8; 256];
    if count == 0 {
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = i as u8;
        }
        return lut;
    }

    let clip = ((clip_limit * count as f32 / 256.0) as u64).max(1);
    let mut excess = 0u64;
    for bin in histogram.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in histogram.iter_mut().enumerate() {
        *bin += share + u64::from(i < remainder);
    }

    let mut cdf = 0u64;
    for (i, bin) in histogram.iter().enumerate() {
        cdf += bin;
        lut[i] = ((cdf as f64 * 255.0 / count as f64).round()).min(255.0) as u8;
    }
    lut
}
