// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multiple-font discriminator.
//
// Decides whether the filtered regions of one image were set in more than
// one typeface. Evidence is taken in a fixed order and the first decisive
// step wins:
//
// 1. too few regions: single font;
// 2. robust height variation (MAD based, so one outlier cannot trip it);
// 3. two height bands, split at the widest gap between sorted heights,
//    that also differ in stroke density, saturation or brightness;
// 4. dominant height band: single font, which silences the weaker steps
//    5 and 6;
// 5. area spread;
// 6. repeated text rendered at clearly different sizes or weights.

use std::collections::HashMap;

use glyphgate_core::config::MultiFontConfig;
use glyphgate_core::types::FusedRegion;
use serde::Serialize;
use tracing::{debug, instrument};

/// Scale factor turning a median absolute deviation into a standard
/// deviation estimate for normally distributed data.
const MAD_TO_SIGMA: f32 = 1.4826;

/// Which step settled the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    InsufficientEvidence,
    RobustVariation,
    ClusterContrast,
    AreaRatio,
    TextGroupContrast,
    Homogeneous,
}

/// Height and area statistics the verdict was based on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontStatistics {
    pub regions: usize,
    pub median_height: f32,
    pub mad: f32,
    pub robust_cv: f32,
    pub in_band_fraction: f32,
    pub dominant_band: bool,
    pub height_ratio: f32,
    pub area_ratio: f32,
    /// Height separating the small and large bands; 0 when all heights match.
    pub band_split: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontVerdict {
    pub multiple_fonts: bool,
    pub reason: DecisionReason,
    pub stats: FontStatistics,
}

impl FontVerdict {
    fn new(multiple_fonts: bool, reason: DecisionReason, stats: FontStatistics) -> Self {
        Self {
            multiple_fonts,
            reason,
            stats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultiFontDiscriminator {
    config: MultiFontConfig,
}

impl MultiFontDiscriminator {
    pub fn new(config: MultiFontConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MultiFontConfig {
        &self.config
    }

    /// Pure function of the regions and the configuration.
    #[instrument(skip_all, fields(regions = regions.len()))]
    pub fn classify(&self, regions: &[FusedRegion]) -> FontVerdict {
        let cfg = &self.config;
        let stats = self.statistics(regions);

        if regions.len() < cfg.min_regions_count {
            debug!("Too few regions to compare fonts");
            return FontVerdict::new(false, DecisionReason::InsufficientEvidence, stats);
        }

        if stats.robust_cv > cfg.size_variation_threshold {
            debug!(robust_cv = stats.robust_cv, "Heights vary beyond one font");
            return FontVerdict::new(true, DecisionReason::RobustVariation, stats);
        }

        if stats.height_ratio > cfg.height_ratio_threshold
            && self.clusters_contrast(regions, stats.band_split)
        {
            return FontVerdict::new(true, DecisionReason::ClusterContrast, stats);
        }

        if stats.dominant_band {
            debug!(
                in_band = stats.in_band_fraction,
                "Dominant height band, weak evidence ignored"
            );
            return FontVerdict::new(false, DecisionReason::Homogeneous, stats);
        }

        if stats.area_ratio > cfg.area_ratio_threshold {
            debug!(area_ratio = stats.area_ratio, "Region areas spread too far");
            return FontVerdict::new(true, DecisionReason::AreaRatio, stats);
        }

        if self.text_groups_contrast(regions) {
            return FontVerdict::new(true, DecisionReason::TextGroupContrast, stats);
        }

        FontVerdict::new(false, DecisionReason::Homogeneous, stats)
    }

    fn statistics(&self, regions: &[FusedRegion]) -> FontStatistics {
        let heights: Vec<f32> = regions.iter().map(|r| r.height as f32).collect();
        let median_height = median(&heights);
        let deviations: Vec<f32> = heights.iter().map(|h| (h - median_height).abs()).collect();
        let mad = median(&deviations);
        let robust_cv = if median_height > 0.0 {
            MAD_TO_SIGMA * mad / median_height
        } else {
            0.0
        };

        let band = self.config.band_tolerance * median_height;
        let in_band = deviations.iter().filter(|d| **d <= band).count();
        let in_band_fraction = if heights.is_empty() {
            0.0
        } else {
            in_band as f32 / heights.len() as f32
        };

        let height_ratio = spread(heights.iter().copied());
        let area_ratio = spread(regions.iter().map(|r| r.area as f32));
        let band_split = band_split(&heights).unwrap_or(0.0);

        FontStatistics {
            regions: regions.len(),
            median_height,
            mad,
            robust_cv,
            in_band_fraction,
            dominant_band: !heights.is_empty() && in_band_fraction >= self.config.in_band_fraction,
            height_ratio,
            area_ratio,
            band_split,
        }
    }

    /// Compare appearance metrics of the regions clearly below and clearly
    /// above the band split. Regions within the cluster factors of the split
    /// belong to neither side.
    fn clusters_contrast(&self, regions: &[FusedRegion], split: f32) -> bool {
        let cfg = &self.config;
        if split <= 0.0 {
            return false;
        }
        let small: Vec<&FusedRegion> = regions
            .iter()
            .filter(|r| r.height as f32 <= split * cfg.small_cluster_factor)
            .collect();
        let large: Vec<&FusedRegion> = regions
            .iter()
            .filter(|r| r.height as f32 >= split * cfg.large_cluster_factor)
            .collect();

        if small.len() < cfg.min_regions_per_cluster || large.len() < cfg.min_regions_per_cluster {
            debug!(
                small = small.len(),
                large = large.len(),
                "Height clusters too thin to compare"
            );
            return false;
        }

        let diffs = [
            (
                mean(small.iter().map(|r| r.density)) - mean(large.iter().map(|r| r.density)),
                cfg.density_diff_threshold,
            ),
            (
                mean(small.iter().map(|r| r.saturation)) - mean(large.iter().map(|r| r.saturation)),
                cfg.saturation_diff_threshold,
            ),
            (
                mean(small.iter().map(|r| r.brightness)) - mean(large.iter().map(|r| r.brightness)),
                cfg.brightness_diff_threshold,
            ),
        ];
        let differing = diffs
            .iter()
            .filter(|(diff, threshold)| diff.abs() > *threshold)
            .count();

        debug!(
            small = small.len(),
            large = large.len(),
            differing,
            required = cfg.require_metric_count,
            "Height clusters compared"
        );
        differing >= cfg.require_metric_count
    }

    /// Compare the two largest groups of repeated text (case and punctuation
    /// folded). Groups need at least two members. Fusion has already merged
    /// exact repeats, so members here differ only in case, punctuation or
    /// spacing.
    fn text_groups_contrast(&self, regions: &[FusedRegion]) -> bool {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&FusedRegion>> = HashMap::new();
        for region in regions {
            let key: String = region
                .text
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if key.is_empty() {
                continue;
            }
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(region);
        }

        let mut repeated: Vec<&Vec<&FusedRegion>> = order
            .iter()
            .filter_map(|key| groups.get(key))
            .filter(|members| members.len() >= 2)
            .collect();
        // Stable sort: equal-sized groups keep first-appearance order.
        repeated.sort_by(|a, b| b.len().cmp(&a.len()));

        let [first, second, ..] = repeated.as_slice() else {
            return false;
        };

        let first_height = median(&first.iter().map(|r| r.height as f32).collect::<Vec<_>>());
        let second_height = median(&second.iter().map(|r| r.height as f32).collect::<Vec<_>>());
        let height_ratio = first_height.max(second_height) / first_height.min(second_height).max(1.0);
        let density_gap = (median(&first.iter().map(|r| r.density).collect::<Vec<_>>())
            - median(&second.iter().map(|r| r.density).collect::<Vec<_>>()))
        .abs();

        debug!(height_ratio, density_gap, "Repeated text groups compared");
        height_ratio > self.config.group_height_ratio_threshold
            || density_gap > self.config.group_density_diff_threshold
    }
}

fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Geometric midpoint of the widest ratio gap between consecutive sorted
/// heights. `None` when fewer than two distinct positive heights exist.
fn band_split(heights: &[f32]) -> Option<f32> {
    let mut sorted: Vec<f32> = heights.iter().copied().filter(|h| *h > 0.0).collect();
    sorted.sort_by(f32::total_cmp);
    sorted
        .windows(2)
        .filter(|pair| pair[1] > pair[0])
        .max_by(|a, b| (a[1] / a[0]).total_cmp(&(b[1] / b[0])))
        .map(|pair| (pair[0] * pair[1]).sqrt())
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f32 }
}

/// max / min over positive values; 1.0 when undefined.
fn spread(values: impl Iterator<Item = f32>) -> f32 {
    let (lo, hi) = values
        .filter(|v| *v > 0.0)
        .fold((f32::INFINITY, 0.0f32), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if hi > 0.0 && lo.is_finite() { hi / lo } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphgate_core::config::Sensitivity;
    use glyphgate_core::geometry::BoundingShape;
    use image::RgbImage;

    fn region(text: &str, width: u32, height: u32, density: f32, brightness: f32) -> FusedRegion {
        FusedRegion {
            text: text.into(),
            confidence: 0.9,
            bbox: BoundingShape::Malformed,
            x_min: 0,
            y_min: 0,
            x_max: width,
            y_max: height,
            width,
            height,
            area: width as u64 * height as u64,
            font_size_estimate: height as f32 * 0.7,
            region_pixels: RgbImage::new(1, 1),
            density,
            saturation: 0.1,
            brightness,
            variant: "original".into(),
        }
    }

    fn plain(text: &str, width: u32, height: u32) -> FusedRegion {
        region(text, width, height, 0.2, 0.7)
    }

    fn balanced() -> MultiFontDiscriminator {
        MultiFontDiscriminator::new(MultiFontConfig::preset(Sensitivity::Balanced))
    }

    #[test]
    fn median_handles_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn two_regions_are_insufficient_evidence() {
        let verdict = balanced().classify(&[plain("HELLO", 200, 40), plain("WORLD", 60, 12)]);
        assert!(!verdict.multiple_fonts);
        assert_eq!(verdict.reason, DecisionReason::InsufficientEvidence);
    }

    #[test]
    fn uniform_body_text_is_one_font() {
        let regions: Vec<FusedRegion> = (0..10)
            .map(|i| plain(&format!("word{i}"), 80 + i * 5, 30 + i % 3))
            .collect();
        let verdict = balanced().classify(&regions);
        assert!(!verdict.multiple_fonts);
        assert_eq!(verdict.reason, DecisionReason::Homogeneous);
        assert!(verdict.stats.dominant_band);
    }

    #[test]
    fn wildly_spread_heights_are_robust_variation() {
        let regions = vec![
            plain("tiny", 40, 10),
            plain("small", 60, 20),
            plain("mid", 80, 40),
            plain("big", 160, 80),
            plain("huge", 300, 160),
        ];
        let verdict = balanced().classify(&regions);
        assert!(verdict.multiple_fonts);
        assert_eq!(verdict.reason, DecisionReason::RobustVariation);
        assert!(verdict.stats.robust_cv > 0.7);
    }

    #[test]
    fn one_outlier_does_not_move_the_robust_statistic() {
        let mut regions: Vec<FusedRegion> = (0..8).map(|i| plain(&format!("w{i}x"), 100, 30)).collect();
        regions.push(plain("HEADLINE", 100, 200));
        let verdict = balanced().classify(&regions);
        assert!(verdict.stats.robust_cv < 0.1);
        assert!(!verdict.multiple_fonts);
    }

    #[test]
    fn height_clusters_with_different_appearance() {
        let regions = vec![
            region("aa", 100, 24, 0.10, 0.2),
            region("bb", 100, 25, 0.10, 0.2),
            region("cc", 100, 26, 0.10, 0.2),
            region("dd", 100, 40, 0.25, 0.5),
            region("ee", 100, 56, 0.40, 0.8),
            region("ff", 100, 58, 0.40, 0.8),
            region("gg", 100, 60, 0.40, 0.8),
        ];
        let verdict = balanced().classify(&regions);
        assert!(verdict.multiple_fonts);
        assert_eq!(verdict.reason, DecisionReason::ClusterContrast);
    }

    #[test]
    fn headline_band_with_few_members_still_forms_a_cluster() {
        // Widths keep the area spread under every preset's threshold.
        let regions = vec![
            region("SALE", 100, 90, 0.45, 0.2),
            region("NOW", 100, 88, 0.45, 0.2),
            region("HERE", 100, 85, 0.45, 0.2),
            region("off", 300, 20, 0.10, 0.8),
            region("today", 300, 22, 0.10, 0.8),
            region("only", 300, 21, 0.10, 0.8),
            region("limited", 300, 19, 0.10, 0.8),
            region("time", 300, 23, 0.10, 0.8),
        ];
        let verdict = balanced().classify(&regions);
        assert!(verdict.stats.area_ratio < 5.0);
        assert!(verdict.stats.band_split > 23.0 && verdict.stats.band_split < 85.0);
        assert!(verdict.multiple_fonts);
        assert_eq!(verdict.reason, DecisionReason::ClusterContrast);

        let relaxed = MultiFontDiscriminator::new(MultiFontConfig::preset(Sensitivity::Relaxed));
        assert_eq!(relaxed.classify(&regions).reason, DecisionReason::ClusterContrast);
    }

    #[test]
    fn band_split_sits_in_the_widest_gap() {
        let split = band_split(&[20.0, 22.0, 21.0, 90.0, 88.0]).unwrap();
        assert!((split - (22.0f32 * 88.0).sqrt()).abs() < 1e-3);
        assert_eq!(band_split(&[30.0, 30.0, 30.0]), None);
        assert_eq!(band_split(&[]), None);
    }

    #[test]
    fn height_clusters_with_same_appearance_stay_single() {
        let regions = vec![
            plain("aa", 100, 24),
            plain("bb", 100, 25),
            plain("cc", 100, 26),
            plain("dd", 100, 40),
            plain("ee", 100, 56),
            plain("ff", 100, 58),
            plain("gg", 100, 60),
        ];
        let verdict = balanced().classify(&regions);
        assert!(!verdict.multiple_fonts);
        assert_eq!(verdict.reason, DecisionReason::Homogeneous);
    }

    #[test]
    fn headline_and_body_split_by_area() {
        let regions = vec![
            plain("SALE", 220, 90),
            plain("50", 120, 88),
            plain("off", 60, 20),
            plain("today", 90, 22),
            plain("only", 70, 21),
            plain("limited", 60, 19),
            plain("time", 70, 23),
        ];
        let verdict = balanced().classify(&regions);
        assert!(verdict.multiple_fonts);
        assert_eq!(verdict.reason, DecisionReason::AreaRatio);
        assert!(!verdict.stats.dominant_band);
    }

    #[test]
    fn dominant_band_suppresses_area_evidence() {
        let mut regions: Vec<FusedRegion> =
            (0..9).map(|i| plain(&format!("w{i}x"), 100, 39 + i % 3)).collect();
        regions.push(plain("a very long line of running text", 2000, 40));
        let verdict = balanced().classify(&regions);
        assert!(verdict.stats.area_ratio > 8.0);
        assert!(!verdict.multiple_fonts);
    }

    #[test]
    fn repeated_text_at_different_sizes() {
        let regions = vec![
            plain("SALE", 100, 40),
            plain("Sale!", 100, 42),
            plain("off", 100, 20),
            plain("OFF", 100, 21),
            plain("now", 100, 30),
        ];
        let verdict = balanced().classify(&regions);
        assert!(verdict.multiple_fonts);
        assert_eq!(verdict.reason, DecisionReason::TextGroupContrast);
    }

    #[test]
    fn classification_is_idempotent() {
        let regions = vec![
            plain("SALE", 220, 90),
            plain("off", 60, 20),
            plain("today", 90, 22),
            plain("only", 70, 21),
        ];
        let discriminator = balanced();
        assert_eq!(discriminator.classify(&regions), discriminator.classify(&regions));
    }
}
