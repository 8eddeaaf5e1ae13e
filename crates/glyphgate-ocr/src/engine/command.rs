// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External recognizer run as a subprocess.
//
// Each call writes the image to a scratch PNG, runs
// `<program> <args…> <png-path>`, and parses stdout as JSON. This lets any
// recognizer with a small wrapper script (PaddleOCR, EasyOCR, a remote client)
// sit behind the pipeline without linking it.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use glyphgate_core::error::{GlyphgateError, Result};
use glyphgate_vision::ImageProcessor;
use image::{DynamicImage, Rgb, RgbImage};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::RecognitionEngine;

/// Side of the blank image used to probe the recognizer.
const PROBE_SIDE: u32 = 32;

/// Recognition engine backed by an external program.
#[derive(Debug)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    available: bool,
    last_error: Option<String>,
}

impl CommandEngine {
    /// Create the engine and probe it once on a blank image.
    ///
    /// A failing probe does not make construction fail; the engine reports
    /// itself unavailable until a later [`RecognitionEngine::reinitialize`]
    /// succeeds.
    #[instrument(skip(args), fields(program = %program.as_ref().display()))]
    pub fn new(program: impl AsRef<std::path::Path>, args: Vec<String>) -> Self {
        let mut engine = Self {
            program: program.as_ref().to_path_buf(),
            args,
            available: false,
            last_error: None,
        };
        if let Err(err) = engine.reinitialize() {
            warn!(error = %err, "Recognizer probe failed");
        }
        engine
    }

    /// Why the last probe failed, if it did.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn run(&self, image: &DynamicImage) -> Result<Value> {
        let png = ImageProcessor::from_dynamic(image.clone()).to_png_bytes()?;

        let mut scratch = tempfile::Builder::new()
            .prefix("glyphgate-")
            .suffix(".png")
            .tempfile()?;
        scratch.write_all(&png)?;
        scratch.flush()?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(scratch.path())
            .output()
            .map_err(|err| {
                GlyphgateError::EngineError(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    err
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GlyphgateError::EngineError(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        debug!(stdout_len = trimmed.len(), "Recognizer finished");
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(trimmed).map_err(|err| {
            GlyphgateError::EngineError(format!("recognizer output is not JSON: {}", err))
        })
    }
}

impl RecognitionEngine for CommandEngine {
    fn name(&self) -> &str {
        "command"
    }

    fn detect(&mut self, image: &DynamicImage) -> Result<Value> {
        if !self.available {
            return Err(GlyphgateError::EngineUnavailable(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| "recognizer not probed".into()),
            ));
        }
        self.run(image)
    }

    fn is_available(&self) -> bool {
        self.available
    }

    #[instrument(skip(self), fields(program = %self.program.display()))]
    fn reinitialize(&mut self) -> Result<()> {
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            PROBE_SIDE,
            PROBE_SIDE,
            Rgb([255, 255, 255]),
        ));
        match self.run(&blank) {
            Ok(_) => {
                self.available = true;
                self.last_error = None;
                info!("Recognizer probe succeeded");
                Ok(())
            }
            Err(err) => {
                self.available = false;
                self.last_error = Some(err.to_string());
                Err(GlyphgateError::EngineUnavailable(err.to_string()))
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable shell script into `dir` and return its path.
    fn script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("recognizer.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn echoes_json_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, r#"echo '[[[[0,0],[10,0],[10,5],[0,5]],["HI",0.9]]]'"#);
        let mut engine = CommandEngine::new(&program, Vec::new());
        assert!(engine.is_available());
        let value = engine.detect(&DynamicImage::new_rgb8(8, 8)).unwrap();
        assert_eq!(value[0][1][0], "HI");
    }

    #[test]
    fn image_path_is_passed_last() {
        let dir = tempfile::tempdir().unwrap();
        // Prints the extension of its final argument as a JSON string.
        let program = script(&dir, r#"for last; do :; done; echo "\"${last##*.}\"""#);
        let mut engine = CommandEngine::new(&program, vec!["--lang".into(), "en".into()]);
        let value = engine.detect(&DynamicImage::new_rgb8(8, 8)).unwrap();
        assert_eq!(value, Value::String("png".into()));
    }

    #[test]
    fn failing_probe_marks_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "echo 'model missing' >&2; exit 3");
        let mut engine = CommandEngine::new(&program, Vec::new());
        assert!(!engine.is_available());
        assert!(engine.last_error().unwrap().contains("model missing"));
        assert!(matches!(
            engine.detect(&DynamicImage::new_rgb8(8, 8)),
            Err(GlyphgateError::EngineUnavailable(_))
        ));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let engine = CommandEngine::new("/nonexistent/glyphgate-recognizer", Vec::new());
        assert!(!engine.is_available());
    }

    #[test]
    fn empty_stdout_means_no_detections() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "true");
        let mut engine = CommandEngine::new(&program, Vec::new());
        assert_eq!(engine.detect(&DynamicImage::new_rgb8(8, 8)).unwrap(), Value::Null);
    }
}
