// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline orchestrator.
//
// variants -> engine per variant -> fusion -> noise filter -> quality gate
// -> discriminator -> AnalysisResult. Everything runs on the caller's thread;
// serialisation across requests is the worker's job.

use glyphgate_core::config::{AnalysisOptions, PipelineConfig};
use glyphgate_core::error::{GlyphgateError, Result};
use glyphgate_core::types::AnalysisResult;
use glyphgate_vision::{ImageProcessor, VariantGenerator};
use image::DynamicImage;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::adapter::EngineAdapter;
use crate::discriminator::{FontVerdict, MultiFontDiscriminator};
use crate::engine::RecognitionEngine;
use crate::filter::NoiseFilter;
use crate::fusion::fuse_detections;
use crate::quality::{GateReport, QualityGate};

/// `AnalysisResult` plus the intermediate decisions that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    /// `None` when the quality gate refused the image.
    pub verdict: Option<FontVerdict>,
    pub gate: GateReport,
    pub variants_generated: usize,
    /// Transforms that failed plus engine calls that failed.
    pub variants_failed: usize,
    pub detections_seen: usize,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    generator: VariantGenerator,
    adapter: EngineAdapter,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generator: VariantGenerator::new(config.variants.clone()),
            adapter: EngineAdapter,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode an uploaded image and analyse it.
    pub fn analyze_bytes(
        &self,
        engine: &mut dyn RecognitionEngine,
        data: &[u8],
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport> {
        let image = ImageProcessor::from_bytes(data)?.into_dynamic();
        self.analyze(engine, &image, options)
    }

    /// Analyse one image.
    ///
    /// `Err` only for an unavailable engine or an empty image. A gate refusal
    /// or a multiple-font verdict is an `Ok` report whose result says so.
    #[instrument(skip_all, fields(
        engine = engine.name(),
        width = image.width(),
        height = image.height(),
    ))]
    pub fn analyze(
        &self,
        engine: &mut dyn RecognitionEngine,
        image: &DynamicImage,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport> {
        if !engine.is_available() {
            return Err(GlyphgateError::EngineUnavailable(format!(
                "{} engine is not initialised",
                engine.name()
            )));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(GlyphgateError::ImageError("image has no pixels".into()));
        }

        let quality = self.config.quality_for(options);
        let multi_font = self.config.multi_font_for(options);

        let set = self.generator.generate(image);
        let variants_generated = set.variants.len();
        let mut variants_failed = set.failures.len();

        let mut detections = Vec::new();
        for variant in &set.variants {
            match self.adapter.try_detect_variant(engine, variant) {
                Ok(found) => detections.extend(found),
                Err(err @ GlyphgateError::EngineUnavailable(_)) => {
                    warn!(label = variant.label, error = %err, "Engine lost mid-request");
                    return Err(err);
                }
                Err(err) => {
                    variants_failed += 1;
                    warn!(label = variant.label, error = %err, "Variant produced no detections");
                }
            }
        }
        let detections_seen = detections.len();

        let source = image.to_rgb8();
        let fused = fuse_detections(detections, &source);
        let regions = NoiseFilter::new(&quality).apply(fused);
        let gate = QualityGate::new(quality).evaluate(&regions);

        let text_content = regions
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let (result, verdict) = match gate.failure {
            Some(failure) => (
                AnalysisResult {
                    has_text: false,
                    multiple_fonts: false,
                    confidence: gate.avg_confidence,
                    text_content,
                    regions_count: regions.len(),
                    text_regions: regions,
                    error: Some(failure.diagnostic().to_string()),
                },
                None,
            ),
            None => {
                let verdict = MultiFontDiscriminator::new(multi_font).classify(&regions);
                (
                    AnalysisResult {
                        has_text: true,
                        multiple_fonts: verdict.multiple_fonts,
                        confidence: gate.avg_confidence,
                        text_content,
                        regions_count: regions.len(),
                        text_regions: regions,
                        error: None,
                    },
                    Some(verdict),
                )
            }
        };

        info!(
            variants_generated,
            variants_failed,
            detections_seen,
            regions = result.regions_count,
            has_text = result.has_text,
            multiple_fonts = result.multiple_fonts,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            result,
            verdict,
            gate,
            variants_generated,
            variants_failed,
            detections_seen,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StaticEngine;
    use crate::engine::static_engine::Reply;
    use glyphgate_core::types::Outcome;
    use image::{Rgb, RgbImage};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn canvas() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(300, 120, |x, y| {
            if (x / 3 + y / 5) % 3 == 0 { Rgb([20, 20, 20]) } else { Rgb([240, 240, 240]) }
        }))
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn unavailable_engine_is_never_called() {
        let mut engine = StaticEngine::unavailable(false);
        let calls = engine.call_counter();
        let err = pipeline()
            .analyze(&mut engine, &canvas(), &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, GlyphgateError::EngineUnavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn accepted_text_flows_through() {
        let mut engine = StaticEngine::always(json!([
            [[[10, 10], [150, 10], [150, 50], [10, 50]], ["HELLO", 0.9]],
            [[[160, 10], [290, 10], [290, 52], [160, 52]], ["WORLD", 0.88]],
        ]));
        let report = pipeline()
            .analyze(&mut engine, &canvas(), &AnalysisOptions::default())
            .unwrap();
        assert_eq!(report.result.outcome(), Outcome::Accepted);
        assert_eq!(report.result.text_content, "HELLO WORLD");
        assert_eq!(report.result.regions_count, 2);
        assert_eq!(report.verdict.map(|v| v.multiple_fonts), Some(false));
        assert_eq!(report.detections_seen, 2 * report.variants_generated);
    }

    #[test]
    fn failing_variants_are_counted_not_fatal() {
        let mut engine = StaticEngine::scripted(
            vec![Reply::Fail("decoder crashed".into()), Reply::Json(json!({"unexpected": 1}))],
            Reply::Json(json!([])),
        );
        let report = pipeline()
            .analyze(&mut engine, &canvas(), &AnalysisOptions::default())
            .unwrap();
        assert_eq!(report.variants_failed, 2);
        assert!(!report.result.has_text);
        assert_eq!(report.result.error.as_deref(), Some("no text found"));
    }

    #[test]
    fn empty_image_is_rejected() {
        let mut engine = StaticEngine::empty();
        let err = pipeline()
            .analyze(&mut engine, &DynamicImage::new_rgb8(0, 0), &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, GlyphgateError::ImageError(_)));
    }

    #[test]
    fn undecodable_bytes_are_an_image_error() {
        let mut engine = StaticEngine::empty();
        let err = pipeline()
            .analyze_bytes(&mut engine, b"not an image", &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, GlyphgateError::ImageError(_)));
    }
}
