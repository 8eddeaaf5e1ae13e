// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process recognizer built on the `ocrs` crate, a pure-Rust OCR engine
// backed by neural network models executed via `rten`.
//
// # Feature Gate
//
// Only available with the `ocrs` feature:
//
// ```toml
// glyphgate-ocr = { path = "crates/glyphgate-ocr", features = ["ocrs"] }
// ```
//
// # Model Setup
//
// Two model files are needed:
//
// - **Detection model** (`text-detection.rten`): locates text regions.
// - **Recognition model** (`text-recognition.rten`): decodes characters.
//
// Running `ocrs-cli` once downloads both into `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is where this engine looks by default.
//
// `ocrs` reports no per-line confidence, so lines are emitted as
// `[quad, text]` records and the adapter applies its default confidence.

use std::path::{Path, PathBuf};

use glyphgate_core::error::{GlyphgateError, Result};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::RecognitionEngine;

/// Default directory for cached model files.
///
/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs` when
/// `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Where to find the two model files.
#[derive(Debug, Clone)]
pub struct OcrModelConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrModelConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrModelConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(GlyphgateError::EngineUnavailable(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Recognition engine running `ocrs` models in-process.
///
/// Model loading is the expensive step; it happens at construction and again
/// on every [`RecognitionEngine::reinitialize`].
pub struct OcrsEngine {
    config: OcrModelConfig,
    engine: Option<OcrEngine>,
    last_error: Option<String>,
}

impl OcrsEngine {
    /// Load models. A load failure leaves the engine unavailable rather than
    /// failing construction.
    pub fn new(config: OcrModelConfig) -> Self {
        let mut engine = Self {
            config,
            engine: None,
            last_error: None,
        };
        if let Err(err) = engine.reinitialize() {
            warn!(error = %err, "OCR models not loaded");
        }
        engine
    }

    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    fn load(config: &OcrModelConfig) -> Result<OcrEngine> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            GlyphgateError::EngineUnavailable(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                GlyphgateError::EngineUnavailable(format!(
                    "failed to load recognition model from {}: {}",
                    config.recognition_model_path.display(),
                    err
                ))
            })?;

        OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            GlyphgateError::EngineUnavailable(format!("failed to initialise OCR engine: {}", err))
        })
    }
}

impl RecognitionEngine for OcrsEngine {
    fn name(&self) -> &str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn detect(&mut self, image: &DynamicImage) -> Result<Value> {
        let Some(engine) = self.engine.as_ref() else {
            return Err(GlyphgateError::EngineUnavailable(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| "OCR models not loaded".into()),
            ));
        };

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            GlyphgateError::EngineError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = engine
            .prepare_input(source)
            .map_err(|err| GlyphgateError::EngineError(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = engine
            .detect_words(&input)
            .map_err(|err| GlyphgateError::EngineError(format!("word detection failed: {}", err)))?;
        let line_rects = engine.find_text_lines(&input, &word_rects);
        let lines = engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| GlyphgateError::EngineError(format!("line recognition failed: {}", err)))?;

        let records: Vec<Value> = lines
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                if text.trim().is_empty() {
                    return None;
                }
                let rect = line.bounding_rect();
                let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
                Some(json!([[[l, t], [r, t], [r, b], [l, b]], text]))
            })
            .collect();

        debug!(
            words = word_rects.len(),
            lines = records.len(),
            "OCR recognition complete"
        );
        Ok(Value::Array(records))
    }

    fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    fn reinitialize(&mut self) -> Result<()> {
        self.engine = None;
        match Self::load(&self.config) {
            Ok(engine) => {
                self.engine = Some(engine);
                self.last_error = None;
                info!("OCR engine initialised successfully");
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_to_cache_dir() {
        let config = OcrModelConfig::default();
        let det = config.detection_model_path.to_string_lossy();
        assert!(det.ends_with(DETECTION_MODEL_FILENAME), "got {det}");
        let rec = config.recognition_model_path.to_string_lossy();
        assert!(rec.ends_with(RECOGNITION_MODEL_FILENAME), "got {rec}");
    }

    #[test]
    fn config_from_paths() {
        let config = OcrModelConfig::from_paths("/a/detect.rten", "/b/recog.rten");
        assert_eq!(config.detection_model_path, PathBuf::from("/a/detect.rten"));
        assert_eq!(config.recognition_model_path, PathBuf::from("/b/recog.rten"));
    }

    #[test]
    fn missing_models_leave_engine_unavailable() {
        let mut engine = OcrsEngine::new(OcrModelConfig::from_dir("/nonexistent/ocr-models"));
        assert!(!engine.is_available());
        assert!(matches!(
            engine.detect(&DynamicImage::new_rgb8(4, 4)),
            Err(GlyphgateError::EngineUnavailable(_))
        ));
    }
}
