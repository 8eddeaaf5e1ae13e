// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Variant generator — a fixed, ordered catalogue of renderings of one source
// image, each giving the recognizer another chance at faint, tiny, inverted or
// colour-masked text.

use std::panic::{AssertUnwindSafe, catch_unwind};

use glyphgate_core::config::VariantConfig;
use glyphgate_core::error::{GlyphgateError, Result};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use super::enhance::{TextEnhancer, dominant_accent_hue};
use crate::image::processor::ImageProcessor;

/// Every transform the generator knows, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Original,
    Upscale,
    UpscaleLarge,
    Contrast,
    Clahe,
    ClaheLocal,
    AdaptiveThreshold,
    Otsu,
    Inverted,
    MorphClose,
    MorphOpen,
    Unsharp,
    SoftBlur,
    Brightened,
    Combined,
    AccentSuppressed,
}

impl VariantKind {
    pub const ALL: [VariantKind; 16] = [
        VariantKind::Original,
        VariantKind::Upscale,
        VariantKind::UpscaleLarge,
        VariantKind::Contrast,
        VariantKind::Clahe,
        VariantKind::ClaheLocal,
        VariantKind::AdaptiveThreshold,
        VariantKind::Otsu,
        VariantKind::Inverted,
        VariantKind::MorphClose,
        VariantKind::MorphOpen,
        VariantKind::Unsharp,
        VariantKind::SoftBlur,
        VariantKind::Brightened,
        VariantKind::Combined,
        VariantKind::AccentSuppressed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Upscale => "upscale",
            Self::UpscaleLarge => "upscale_large",
            Self::Contrast => "contrast",
            Self::Clahe => "clahe",
            Self::ClaheLocal => "clahe_local",
            Self::AdaptiveThreshold => "adaptive_threshold",
            Self::Otsu => "otsu",
            Self::Inverted => "inverted",
            Self::MorphClose => "morph_close",
            Self::MorphOpen => "morph_open",
            Self::Unsharp => "unsharp",
            Self::SoftBlur => "soft_blur",
            Self::Brightened => "brightened",
            Self::Combined => "combined",
            Self::AccentSuppressed => "accent_suppressed",
        }
    }
}

/// One transformed rendering of the source image.
#[derive(Debug, Clone)]
pub struct ImageVariant {
    pub label: &'static str,
    pub image: DynamicImage,
    /// Variant width divided by source width.
    pub scale_x: f32,
    /// Variant height divided by source height.
    pub scale_y: f32,
}

/// Output of one generation pass.
#[derive(Debug)]
pub struct VariantSet {
    pub variants: Vec<ImageVariant>,
    /// Transforms that errored or panicked; always `VariantFailure`.
    pub failures: Vec<GlyphgateError>,
}

/// Deterministic generator of recognition-friendly image variants.
#[derive(Debug, Clone, Default)]
pub struct VariantGenerator {
    config: VariantConfig,
}

impl VariantGenerator {
    pub fn new(config: VariantConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    /// Render every applicable variant of `source`, in catalogue order.
    ///
    /// A transform that errors or panics is logged and omitted; it never
    /// aborts the batch. `original` is present for any non-empty source.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn generate(&self, source: &DynamicImage) -> VariantSet {
        let mut variants = Vec::with_capacity(VariantKind::ALL.len());
        let mut failures = Vec::new();

        for kind in VariantKind::ALL {
            match isolate(kind.label(), || self.render(kind, source)) {
                Ok(Some(image)) => {
                    let scale_x = image.width() as f32 / source.width().max(1) as f32;
                    let scale_y = image.height() as f32 / source.height().max(1) as f32;
                    debug!(label = kind.label(), scale_x, scale_y, "Variant rendered");
                    variants.push(ImageVariant {
                        label: kind.label(),
                        image,
                        scale_x,
                        scale_y,
                    });
                }
                Ok(None) => debug!(label = kind.label(), "Variant not applicable"),
                Err(err) => {
                    warn!(label = kind.label(), error = %err, "Variant skipped");
                    failures.push(err);
                }
            }
        }

        info!(
            generated = variants.len(),
            failed = failures.len(),
            "Variant generation complete"
        );
        VariantSet { variants, failures }
    }

    /// Render a single transform. `Ok(None)` means "not applicable here".
    pub fn render(&self, kind: VariantKind, source: &DynamicImage) -> Result<Option<DynamicImage>> {
        if source.width() == 0 || source.height() == 0 {
            return Err(GlyphgateError::VariantFailure {
                label: kind.label().into(),
                reason: "source image is empty".into(),
            });
        }
        let cfg = &self.config;
        let processor = || ImageProcessor::from_dynamic(source.clone());
        let enhancer = || TextEnhancer::from_dynamic(source.clone());

        let image = match kind {
            VariantKind::Original => source.clone(),
            VariantKind::Upscale => {
                match self.upscale_factor(
                    source,
                    cfg.upscale_min_side,
                    cfg.upscale_target_side,
                    cfg.upscale_min_factor,
                ) {
                    Some(factor) => processor().upscale(factor).into_dynamic(),
                    None => return Ok(None),
                }
            }
            VariantKind::UpscaleLarge => {
                match self.upscale_factor(
                    source,
                    cfg.large_upscale_min_side,
                    cfg.large_upscale_target_side,
                    cfg.large_upscale_min_factor,
                ) {
                    Some(factor) => processor().upscale(factor).into_dynamic(),
                    None => return Ok(None),
                }
            }
            VariantKind::Contrast => processor()
                .scale_intensity(cfg.contrast_alpha, cfg.contrast_beta)
                .into_dynamic(),
            VariantKind::Clahe => enhancer()
                .equalize_adaptive(cfg.clahe_clip_limit, cfg.clahe_tiles)
                .into_dynamic(),
            VariantKind::ClaheLocal => enhancer()
                .equalize_adaptive(cfg.clahe_local_clip_limit, cfg.clahe_local_tiles)
                .into_dynamic(),
            VariantKind::AdaptiveThreshold => enhancer()
                .binarize(cfg.adaptive_block_radius, cfg.adaptive_offset)
                .into_dynamic(),
            VariantKind::Otsu => enhancer().binarize_otsu().into_dynamic(),
            VariantKind::Inverted => processor().invert().into_dynamic(),
            VariantKind::MorphClose => enhancer().close(cfg.morph_radius).into_dynamic(),
            VariantKind::MorphOpen => enhancer().open(cfg.morph_radius).into_dynamic(),
            VariantKind::Unsharp => enhancer()
                .unsharpen(cfg.unsharp_sigma, cfg.unsharp_threshold)
                .into_dynamic(),
            VariantKind::SoftBlur => enhancer().blur(cfg.blur_sigma).into_dynamic(),
            VariantKind::Brightened => processor()
                .scale_intensity(cfg.brighten_alpha, cfg.brighten_beta)
                .into_dynamic(),
            VariantKind::Combined => {
                let boosted = processor()
                    .scale_intensity(cfg.combined_alpha, cfg.combined_beta)
                    .into_dynamic();
                TextEnhancer::from_dynamic(boosted)
                    .blur(cfg.blur_sigma)
                    .binarize(cfg.combined_block_radius, cfg.combined_offset)
                    .into_dynamic()
            }
            VariantKind::AccentSuppressed => {
                let rgb = source.to_rgb8();
                match dominant_accent_hue(
                    &rgb,
                    cfg.accent_min_saturation,
                    cfg.accent_min_value,
                    cfg.accent_min_fraction,
                    cfg.accent_hue_bins,
                ) {
                    Some(band) => TextEnhancer::from_dynamic(DynamicImage::ImageRgb8(rgb))
                        .suppress_hue(band, cfg.accent_min_saturation, cfg.accent_min_value)
                        .into_dynamic(),
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(image))
    }

    /// Scale factor that brings the shorter side up to `target`, or `None`
    /// when the image is already at least `min_side` or the cap on the longer
    /// side leaves no room to grow.
    fn upscale_factor(
        &self,
        source: &DynamicImage,
        min_side: u32,
        target: u32,
        min_factor: f32,
    ) -> Option<f32> {
        let short = source.width().min(source.height());
        let long = source.width().max(source.height());
        if short == 0 || short >= min_side {
            return None;
        }
        let wanted = min_factor.max(target as f32 / short as f32);
        let cap = self.config.max_side as f32 / long as f32;
        let factor = wanted.min(cap);
        (factor > 1.0).then_some(factor)
    }
}

/// Run one transform, turning both errors and panics into `VariantFailure`.
fn isolate<F>(label: &str, transform: F) -> Result<Option<DynamicImage>>
where
    F: FnOnce() -> Result<Option<DynamicImage>>,
{
    match catch_unwind(AssertUnwindSafe(transform)) {
        Ok(Ok(image)) => Ok(image),
        Ok(Err(GlyphgateError::VariantFailure { label, reason })) => {
            Err(GlyphgateError::VariantFailure { label, reason })
        }
        Ok(Err(other)) => Err(GlyphgateError::VariantFailure {
            label: label.into(),
            reason: other.to_string(),
        }),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "transform panicked".into());
            Err(GlyphgateError::VariantFailure {
                label: label.into(),
                reason,
            })
        }
    }
}
