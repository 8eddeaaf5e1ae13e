// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration: quality-gate presets per content type, multi-font
// sensitivity presets, variant-generator constants and queue limits.
//
// Every numeric threshold used by the pipeline lives here. Nothing downstream
// carries its own magic numbers.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GlyphgateError, Result};

/// Version of the on-disk configuration format.
pub const CONFIG_VERSION: u32 = 1;

/// Kind of image being analysed; selects the quality-gate preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    General,
    /// Banners, flyers, coloured backgrounds, short punchy text.
    Advertisement,
    /// Scanned pages with body text.
    Document,
    /// Covers and spreads.
    Book,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::General,
        ContentType::Advertisement,
        ContentType::Document,
        ContentType::Book,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Advertisement => "advertisement",
            Self::Document => "document",
            Self::Book => "book",
        }
    }
}

impl FromStr for ContentType {
    type Err = GlyphgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "default" => Ok(Self::General),
            "advertisement" | "ad" => Ok(Self::Advertisement),
            "document" => Ok(Self::Document),
            "book" => Ok(Self::Book),
            other => Err(GlyphgateError::UnknownPreset(format!("content type '{other}'"))),
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Multi-font sensitivity preset. `Relaxed` flags multiple fonts most readily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Strict,
    #[default]
    Balanced,
    Relaxed,
}

impl Sensitivity {
    pub const ALL: [Sensitivity; 3] = [Sensitivity::Strict, Sensitivity::Balanced, Sensitivity::Relaxed];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Relaxed => "relaxed",
        }
    }
}

impl FromStr for Sensitivity {
    type Err = GlyphgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "balanced" => Ok(Self::Balanced),
            "relaxed" => Ok(Self::Relaxed),
            other => Err(GlyphgateError::UnknownPreset(format!("sensitivity '{other}'"))),
        }
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Thresholds for the noise filter and the text-presence gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Per-region confidence floor applied by the noise filter.
    pub min_confidence: f32,
    /// Minimum length of the cleaned, concatenated text.
    pub min_text_length: usize,
    /// Minimum mean confidence over surviving regions.
    pub min_avg_confidence: f32,
    /// Minimum number of alphabetic characters in the cleaned text.
    pub min_letters_count: usize,
    /// Minimum number of surviving regions. Never below 1.
    pub min_regions_count: usize,
}

impl QualityConfig {
    pub fn for_content(content: ContentType) -> Self {
        match content {
            ContentType::General => Self {
                min_confidence: 0.3,
                min_text_length: 2,
                min_avg_confidence: 0.4,
                min_letters_count: 2,
                min_regions_count: 1,
            },
            ContentType::Advertisement => Self {
                min_confidence: 0.15,
                min_text_length: 2,
                min_avg_confidence: 0.25,
                min_letters_count: 2,
                min_regions_count: 1,
            },
            ContentType::Document => Self {
                min_confidence: 0.4,
                min_text_length: 3,
                min_avg_confidence: 0.5,
                min_letters_count: 3,
                min_regions_count: 1,
            },
            ContentType::Book => Self {
                min_confidence: 0.35,
                min_text_length: 3,
                min_avg_confidence: 0.45,
                min_letters_count: 3,
                min_regions_count: 1,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_unit("quality.min_confidence", self.min_confidence)?;
        check_unit("quality.min_avg_confidence", self.min_avg_confidence)?;
        if self.min_regions_count == 0 {
            return Err(GlyphgateError::InvalidConfig(
                "quality.min_regions_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self::for_content(ContentType::General)
    }
}

/// Thresholds for the multi-font discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiFontConfig {
    /// Robust coefficient of variation (1.4826 × MAD / median height) above
    /// which sizes are too spread to be one font.
    pub size_variation_threshold: f32,
    /// max/min height ratio that triggers the two-cluster comparison.
    pub height_ratio_threshold: f32,
    /// max/min area ratio treated as independent evidence.
    pub area_ratio_threshold: f32,
    /// Below this many regions the verdict is always single font.
    pub min_regions_count: usize,
    /// Each height cluster needs this many members to be compared.
    pub min_regions_per_cluster: usize,
    /// Cluster stroke-density gap that counts as a differing metric.
    pub density_diff_threshold: f32,
    /// Cluster saturation gap that counts as a differing metric.
    pub saturation_diff_threshold: f32,
    /// Cluster brightness gap (0–1 scale) that counts as a differing metric.
    pub brightness_diff_threshold: f32,
    /// How many of density/saturation/brightness must differ (1–3).
    pub require_metric_count: usize,
    /// Fraction of heights inside the median band that biases toward one font.
    pub in_band_fraction: f32,
    /// Half-width of the median band, relative to the median.
    pub band_tolerance: f32,
    /// Heights at or below `median × small_cluster_factor` form the small cluster.
    pub small_cluster_factor: f32,
    /// Heights at or above `median × large_cluster_factor` form the large cluster.
    pub large_cluster_factor: f32,
    /// Median-height ratio between repeated text groups that counts as contrast.
    pub group_height_ratio_threshold: f32,
    /// Density gap between repeated text groups that counts as contrast.
    pub group_density_diff_threshold: f32,
}

impl MultiFontConfig {
    /// Preset table. Every threshold moves monotonically from strict to
    /// relaxed so a relaxed verdict is never less eager than a stricter one.
    pub fn preset(sensitivity: Sensitivity) -> Self {
        match sensitivity {
            Sensitivity::Strict => Self {
                size_variation_threshold: 0.8,
                height_ratio_threshold: 2.5,
                area_ratio_threshold: 12.0,
                min_regions_count: 4,
                min_regions_per_cluster: 3,
                density_diff_threshold: 0.15,
                saturation_diff_threshold: 0.25,
                brightness_diff_threshold: 0.24,
                require_metric_count: 3,
                in_band_fraction: 0.75,
                band_tolerance: 0.30,
                small_cluster_factor: 0.85,
                large_cluster_factor: 1.15,
                group_height_ratio_threshold: 2.0,
                group_density_diff_threshold: 0.2,
            },
            Sensitivity::Balanced => Self {
                size_variation_threshold: 0.7,
                height_ratio_threshold: 2.0,
                area_ratio_threshold: 8.0,
                min_regions_count: 3,
                min_regions_per_cluster: 3,
                density_diff_threshold: 0.10,
                saturation_diff_threshold: 0.18,
                brightness_diff_threshold: 0.18,
                require_metric_count: 2,
                in_band_fraction: 0.80,
                band_tolerance: 0.30,
                small_cluster_factor: 0.85,
                large_cluster_factor: 1.15,
                group_height_ratio_threshold: 1.6,
                group_density_diff_threshold: 0.15,
            },
            Sensitivity::Relaxed => Self {
                size_variation_threshold: 0.55,
                height_ratio_threshold: 1.6,
                area_ratio_threshold: 5.0,
                min_regions_count: 3,
                min_regions_per_cluster: 2,
                density_diff_threshold: 0.07,
                saturation_diff_threshold: 0.12,
                brightness_diff_threshold: 0.12,
                require_metric_count: 1,
                in_band_fraction: 0.85,
                band_tolerance: 0.30,
                small_cluster_factor: 0.85,
                large_cluster_factor: 1.15,
                group_height_ratio_threshold: 1.4,
                group_density_diff_threshold: 0.1,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("multi_font.size_variation_threshold", self.size_variation_threshold)?;
        check_positive("multi_font.density_diff_threshold", self.density_diff_threshold)?;
        check_positive("multi_font.saturation_diff_threshold", self.saturation_diff_threshold)?;
        check_positive("multi_font.brightness_diff_threshold", self.brightness_diff_threshold)?;
        check_positive(
            "multi_font.group_density_diff_threshold",
            self.group_density_diff_threshold,
        )?;
        for (name, ratio) in [
            ("multi_font.height_ratio_threshold", self.height_ratio_threshold),
            ("multi_font.area_ratio_threshold", self.area_ratio_threshold),
            ("multi_font.group_height_ratio_threshold", self.group_height_ratio_threshold),
        ] {
            if !(ratio.is_finite() && ratio > 1.0) {
                return Err(GlyphgateError::InvalidConfig(format!(
                    "{name} must be greater than 1, got {ratio}"
                )));
            }
        }
        check_unit("multi_font.in_band_fraction", self.in_band_fraction)?;
        if !(self.band_tolerance > 0.0 && self.band_tolerance < 1.0) {
            return Err(GlyphgateError::InvalidConfig(format!(
                "multi_font.band_tolerance must be in (0, 1), got {}",
                self.band_tolerance
            )));
        }
        if !(self.small_cluster_factor > 0.0
            && self.small_cluster_factor < 1.0
            && self.large_cluster_factor > 1.0)
        {
            return Err(GlyphgateError::InvalidConfig(
                "multi_font cluster factors must satisfy 0 < small < 1 < large".into(),
            ));
        }
        if !(1..=3).contains(&self.require_metric_count) {
            return Err(GlyphgateError::InvalidConfig(format!(
                "multi_font.require_metric_count must be 1-3, got {}",
                self.require_metric_count
            )));
        }
        if self.min_regions_count < 2 || self.min_regions_per_cluster == 0 {
            return Err(GlyphgateError::InvalidConfig(
                "multi_font needs min_regions_count >= 2 and min_regions_per_cluster >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MultiFontConfig {
    fn default() -> Self {
        Self::preset(Sensitivity::Balanced)
    }
}

/// Constants for every image variant transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    /// Shorter side below which the `upscale` variant is produced.
    pub upscale_min_side: u32,
    pub upscale_target_side: u32,
    pub upscale_min_factor: f32,
    /// Shorter side below which the `upscale_large` variant is produced.
    pub large_upscale_min_side: u32,
    pub large_upscale_target_side: u32,
    pub large_upscale_min_factor: f32,
    /// Upscaled variants never exceed this on their longer side.
    pub max_side: u32,

    pub contrast_alpha: f32,
    pub contrast_beta: f32,

    pub clahe_clip_limit: f32,
    pub clahe_tiles: u32,
    pub clahe_local_clip_limit: f32,
    pub clahe_local_tiles: u32,

    /// Adaptive threshold window is `2 × radius + 1`.
    pub adaptive_block_radius: u32,
    pub adaptive_offset: i32,

    pub morph_radius: u8,

    pub unsharp_sigma: f32,
    pub unsharp_threshold: i32,
    pub blur_sigma: f32,

    pub brighten_alpha: f32,
    pub brighten_beta: f32,

    pub combined_alpha: f32,
    pub combined_beta: f32,
    pub combined_block_radius: u32,
    pub combined_offset: i32,

    /// Pixels less saturated than this never count as accent colour.
    pub accent_min_saturation: f32,
    /// Pixels darker than this (HSV value) never count as accent colour.
    pub accent_min_value: f32,
    /// Share of all pixels the dominant hue must cover to be suppressed.
    pub accent_min_fraction: f32,
    pub accent_hue_bins: u32,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            upscale_min_side: 800,
            upscale_target_side: 800,
            upscale_min_factor: 3.0,
            large_upscale_min_side: 400,
            large_upscale_target_side: 1000,
            large_upscale_min_factor: 5.0,
            max_side: 4096,
            contrast_alpha: 3.0,
            contrast_beta: 50.0,
            clahe_clip_limit: 5.0,
            clahe_tiles: 8,
            clahe_local_clip_limit: 8.0,
            clahe_local_tiles: 4,
            adaptive_block_radius: 7,
            adaptive_offset: 5,
            morph_radius: 1,
            unsharp_sigma: 1.5,
            unsharp_threshold: 2,
            blur_sigma: 0.8,
            brighten_alpha: 2.0,
            brighten_beta: 80.0,
            combined_alpha: 2.5,
            combined_beta: 60.0,
            combined_block_radius: 6,
            combined_offset: 3,
            accent_min_saturation: 0.45,
            accent_min_value: 0.25,
            accent_min_fraction: 0.10,
            accent_hue_bins: 36,
        }
    }
}

impl VariantConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, factor) in [
            ("variants.upscale_min_factor", self.upscale_min_factor),
            ("variants.large_upscale_min_factor", self.large_upscale_min_factor),
            ("variants.contrast_alpha", self.contrast_alpha),
            ("variants.brighten_alpha", self.brighten_alpha),
            ("variants.combined_alpha", self.combined_alpha),
            ("variants.unsharp_sigma", self.unsharp_sigma),
            ("variants.blur_sigma", self.blur_sigma),
            ("variants.clahe_clip_limit", self.clahe_clip_limit),
            ("variants.clahe_local_clip_limit", self.clahe_local_clip_limit),
        ] {
            check_positive(name, factor)?;
        }
        if self.clahe_tiles == 0 || self.clahe_local_tiles == 0 || self.accent_hue_bins == 0 {
            return Err(GlyphgateError::InvalidConfig(
                "variants tile and hue-bin counts must be non-zero".into(),
            ));
        }
        if self.max_side < self.upscale_target_side.max(self.large_upscale_target_side) {
            return Err(GlyphgateError::InvalidConfig(
                "variants.max_side must be at least the upscale targets".into(),
            ));
        }
        check_unit("variants.accent_min_saturation", self.accent_min_saturation)?;
        check_unit("variants.accent_min_value", self.accent_min_value)?;
        check_unit("variants.accent_min_fraction", self.accent_min_fraction)?;
        Ok(())
    }
}

/// Backpressure limits of the recognition queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Jobs that may wait while one runs.
    pub capacity: usize,
    /// How long `submit` waits for a free slot. `None` rejects immediately.
    pub submit_timeout_ms: Option<u64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            submit_timeout_ms: Some(30_000),
        }
    }
}

/// Per-request preset overrides. Absent fields fall back to the process-wide
/// defaults in [`PipelineConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub content_type: Option<ContentType>,
    pub sensitivity: Option<Sensitivity>,
}

impl AnalysisOptions {
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }
}

/// Process-wide pipeline settings, loaded once at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub version: u32,
    /// Default quality preset.
    pub content_type: ContentType,
    /// Default multi-font preset.
    pub sensitivity: Sensitivity,
    /// Replaces the default quality preset when set.
    pub quality: Option<QualityConfig>,
    /// Replaces the default multi-font preset when set.
    pub multi_font: Option<MultiFontConfig>,
    pub variants: VariantConfig,
    pub queue: QueueConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            content_type: ContentType::default(),
            sensitivity: Sensitivity::default(),
            quality: None,
            multi_font: None,
            variants: VariantConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(GlyphgateError::InvalidConfig(format!(
                "config version {} is not supported (expected {CONFIG_VERSION})",
                self.version
            )));
        }
        if let Some(quality) = &self.quality {
            quality.validate()?;
        }
        if let Some(multi_font) = &self.multi_font {
            multi_font.validate()?;
        }
        self.variants.validate()?;
        if self.queue.capacity == 0 {
            return Err(GlyphgateError::InvalidConfig(
                "queue.capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Quality thresholds for one request: an explicit preset wins, then the
    /// configured override, then the default content-type preset.
    pub fn quality_for(&self, options: &AnalysisOptions) -> QualityConfig {
        match (options.content_type, &self.quality) {
            (Some(content), _) => QualityConfig::for_content(content),
            (None, Some(custom)) => custom.clone(),
            (None, None) => QualityConfig::for_content(self.content_type),
        }
    }

    /// Multi-font thresholds for one request, resolved like [`Self::quality_for`].
    pub fn multi_font_for(&self, options: &AnalysisOptions) -> MultiFontConfig {
        match (options.sensitivity, &self.multi_font) {
            (Some(sensitivity), _) => MultiFontConfig::preset(sensitivity),
            (None, Some(custom)) => custom.clone(),
            (None, None) => MultiFontConfig::preset(self.sensitivity),
        }
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GlyphgateError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GlyphgateError::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for content in ContentType::ALL {
            QualityConfig::for_content(content).validate().unwrap();
        }
        for sensitivity in Sensitivity::ALL {
            MultiFontConfig::preset(sensitivity).validate().unwrap();
        }
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn sensitivity_presets_are_monotonic() {
        let strict = MultiFontConfig::preset(Sensitivity::Strict);
        let balanced = MultiFontConfig::preset(Sensitivity::Balanced);
        let relaxed = MultiFontConfig::preset(Sensitivity::Relaxed);

        for (looser, tighter) in [(&balanced, &strict), (&relaxed, &balanced)] {
            assert!(looser.size_variation_threshold <= tighter.size_variation_threshold);
            assert!(looser.height_ratio_threshold <= tighter.height_ratio_threshold);
            assert!(looser.area_ratio_threshold <= tighter.area_ratio_threshold);
            assert!(looser.min_regions_count <= tighter.min_regions_count);
            assert!(looser.min_regions_per_cluster <= tighter.min_regions_per_cluster);
            assert!(looser.density_diff_threshold <= tighter.density_diff_threshold);
            assert!(looser.saturation_diff_threshold <= tighter.saturation_diff_threshold);
            assert!(looser.brightness_diff_threshold <= tighter.brightness_diff_threshold);
            assert!(looser.require_metric_count <= tighter.require_metric_count);
            assert!(looser.in_band_fraction >= tighter.in_band_fraction);
            assert!(looser.group_height_ratio_threshold <= tighter.group_height_ratio_threshold);
            assert!(looser.group_density_diff_threshold <= tighter.group_density_diff_threshold);
        }
    }

    #[test]
    fn advertisement_is_most_permissive() {
        let ad = QualityConfig::for_content(ContentType::Advertisement);
        for content in ContentType::ALL {
            let other = QualityConfig::for_content(content);
            assert!(ad.min_confidence <= other.min_confidence);
            assert!(ad.min_avg_confidence <= other.min_avg_confidence);
        }
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("Relaxed".parse::<Sensitivity>().unwrap(), Sensitivity::Relaxed);
        assert_eq!("default".parse::<ContentType>().unwrap(), ContentType::General);
        assert_eq!("book".parse::<ContentType>().unwrap(), ContentType::Book);
        assert!(matches!(
            "loose".parse::<Sensitivity>(),
            Err(GlyphgateError::UnknownPreset(_))
        ));
    }

    #[test]
    fn request_options_override_process_defaults() {
        let config = PipelineConfig {
            sensitivity: Sensitivity::Strict,
            quality: Some(QualityConfig {
                min_confidence: 0.9,
                ..QualityConfig::default()
            }),
            ..PipelineConfig::default()
        };

        let none = AnalysisOptions::default();
        assert_eq!(config.multi_font_for(&none), MultiFontConfig::preset(Sensitivity::Strict));
        assert_eq!(config.quality_for(&none).min_confidence, 0.9);

        let explicit = AnalysisOptions::default()
            .with_sensitivity(Sensitivity::Relaxed)
            .with_content_type(ContentType::Document);
        assert_eq!(
            config.multi_font_for(&explicit),
            MultiFontConfig::preset(Sensitivity::Relaxed)
        );
        assert_eq!(
            config.quality_for(&explicit),
            QualityConfig::for_content(ContentType::Document)
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"sensitivity": "relaxed"}"#).unwrap();
        assert_eq!(config.sensitivity, Sensitivity::Relaxed);
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.queue.capacity, 8);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let err = PipelineConfig::from_json_str(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(err, GlyphgateError::InvalidConfig(_)));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = PipelineConfig::default();
        config.multi_font = Some(MultiFontConfig {
            require_metric_count: 4,
            ..MultiFontConfig::default()
        });
        assert!(config.validate().is_err());

        config.multi_font = None;
        config.quality = Some(QualityConfig {
            min_regions_count: 0,
            ..QualityConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glyphgate.json");
        let config = PipelineConfig {
            content_type: ContentType::Advertisement,
            queue: QueueConfig {
                capacity: 2,
                submit_timeout_ms: None,
            },
            ..PipelineConfig::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
