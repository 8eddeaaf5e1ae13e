// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cross-variant fusion — one best-evidence region per distinct recognized
// string.

use std::collections::HashMap;

use glyphgate_core::types::{FusedRegion, RawDetection};
use glyphgate_vision::sample_region;
use image::RgbImage;
use tracing::{debug, instrument};

/// Fusion key: trimmed, internal whitespace collapsed to single spaces, case
/// preserved. `None` for text that is empty after trimming.
pub fn normalize_text(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Merge detections from every variant.
///
/// For each normalised text the highest-confidence occurrence wins (the
/// earliest one on ties) and its rectangle is sampled from `source`. Output
/// follows first-appearance order.
#[instrument(skip_all, fields(width = source.width(), height = source.height()))]
pub fn fuse_detections<I>(detections: I, source: &RgbImage) -> Vec<FusedRegion>
where
    I: IntoIterator<Item = RawDetection>,
{
    let mut best: Vec<(String, RawDetection)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen = 0usize;

    for detection in detections {
        seen += 1;
        let Some(key) = normalize_text(&detection.text) else {
            continue;
        };
        match index.get(&key) {
            Some(&slot) => {
                if detection.confidence > best[slot].1.confidence {
                    best[slot].1 = detection;
                }
            }
            None => {
                index.insert(key.clone(), best.len());
                best.push((key, detection));
            }
        }
    }

    debug!(seen, distinct = best.len(), "Detections fused");

    best.into_iter()
        .map(|(text, detection)| {
            let sample = sample_region(source, detection.rect);
            let rect = sample.rect;
            FusedRegion {
                text,
                confidence: detection.confidence,
                bbox: detection.shape,
                x_min: rect.x_min,
                y_min: rect.y_min,
                x_max: rect.x_max,
                y_max: rect.y_max,
                width: rect.width(),
                height: rect.height(),
                area: rect.area(),
                font_size_estimate: rect.font_size_estimate(),
                region_pixels: sample.pixels,
                density: sample.density,
                saturation: sample.saturation,
                brightness: sample.brightness,
                variant: detection.variant,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphgate_core::geometry::{BoundingShape, PixelRect};
    use image::Rgb;

    fn detection(text: &str, confidence: f32, x: u32, variant: &str) -> RawDetection {
        let rect = PixelRect {
            x_min: x,
            y_min: 10,
            x_max: x + 30,
            y_max: 30,
        };
        RawDetection {
            shape: BoundingShape::Rect {
                x1: rect.x_min as f32,
                y1: rect.y_min as f32,
                x2: rect.x_max as f32,
                y2: rect.y_max as f32,
            },
            rect,
            text: text.into(),
            confidence,
            variant: variant.into(),
        }
    }

    fn canvas() -> RgbImage {
        RgbImage::from_fn(200, 50, |x, _| if x % 4 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) })
    }

    #[test]
    fn normalization_trims_and_collapses() {
        assert_eq!(normalize_text("  big \t  SALE \n").as_deref(), Some("big SALE"));
        assert_eq!(normalize_text(" \n "), None);
    }

    #[test]
    fn highest_confidence_occurrence_wins() {
        let fused = fuse_detections(
            vec![
                detection("HELLO", 0.6, 0, "original"),
                detection("HELLO ", 0.9, 100, "upscale"),
                detection("HELLO", 0.7, 50, "otsu"),
            ],
            &canvas(),
        );
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].confidence, 0.9);
        assert_eq!(fused[0].x_min, 100);
        assert_eq!(fused[0].variant, "upscale");
    }

    #[test]
    fn ties_keep_the_first_occurrence() {
        let fused = fuse_detections(
            vec![detection("A1", 0.8, 0, "original"), detection("A1", 0.8, 60, "clahe")],
            &canvas(),
        );
        assert_eq!(fused[0].variant, "original");
    }

    #[test]
    fn case_is_significant_and_order_is_first_appearance() {
        let fused = fuse_detections(
            vec![
                detection("Sale", 0.5, 0, "a"),
                detection("SALE", 0.9, 40, "a"),
                detection("Sale", 0.95, 80, "b"),
                detection("   ", 0.99, 120, "b"),
            ],
            &canvas(),
        );
        let texts: Vec<&str> = fused.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["Sale", "SALE"]);
    }

    #[test]
    fn derived_geometry_and_metrics_are_filled() {
        let fused = fuse_detections(vec![detection("WORD", 0.9, 10, "original")], &canvas());
        let region = &fused[0];
        assert_eq!((region.width, region.height, region.area), (30, 20, 600));
        assert!((region.font_size_estimate - 14.0).abs() < 1e-4);
        assert_eq!(region.region_pixels.dimensions(), (30, 20));
        assert!(region.density > 0.2 && region.density <= 0.5);
        assert!(region.brightness > 0.5);
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert!(fuse_detections(Vec::new(), &canvas()).is_empty());
    }
}
