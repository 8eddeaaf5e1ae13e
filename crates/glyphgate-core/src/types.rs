// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Glyphgate text gate.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{GlyphgateError, Result};
use crate::geometry::{BoundingShape, PixelRect};

/// Why the quality gate refused an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateFailure {
    /// Fewer valid regions than required (usually zero).
    NoTextFound,
    /// Cleaned text shorter than the minimum.
    TextTooShort,
    /// Average confidence below the minimum.
    ConfidenceTooLow,
    /// Too few alphabetic characters, e.g. a logo or a row of digits.
    NotEnoughLetters,
}

impl GateFailure {
    /// Diagnostic string carried in `AnalysisResult::error`.
    pub fn diagnostic(&self) -> &'static str {
        match self {
            Self::NoTextFound => "no text found",
            Self::TextTooShort => "text too short",
            Self::ConfidenceTooLow => "confidence too low",
            Self::NotEnoughLetters => "not enough letters",
        }
    }

    /// Inverse of [`GateFailure::diagnostic`].
    pub fn from_diagnostic(s: &str) -> Option<Self> {
        [
            Self::NoTextFound,
            Self::TextTooShort,
            Self::ConfidenceTooLow,
            Self::NotEnoughLetters,
        ]
        .into_iter()
        .find(|f| f.diagnostic() == s)
    }
}

impl std::fmt::Display for GateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.diagnostic())
    }
}

/// One recognized string reported by the engine for one variant.
///
/// `shape` and `rect` are already mapped into source-image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub shape: BoundingShape,
    pub rect: PixelRect,
    pub text: String,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    /// Label of the variant that produced this detection.
    pub variant: String,
}

/// Best-evidence record for one distinct recognized string.
#[derive(Debug, Clone, Serialize)]
pub struct FusedRegion {
    pub text: String,
    /// Maximum confidence over every variant that found this text.
    pub confidence: f32,
    /// Geometry of the highest-confidence occurrence in source coordinates.
    pub bbox: BoundingShape,
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
    pub width: u32,
    pub height: u32,
    pub area: u64,
    pub font_size_estimate: f32,
    /// Cropped source pixels, kept for downstream characteristic extraction.
    #[serde(skip)]
    pub region_pixels: RgbImage,
    /// Fraction of crop pixels belonging to strokes, in `[0, 1]`.
    pub density: f32,
    /// Mean HSV saturation of the crop, in `[0, 1]`.
    pub saturation: f32,
    /// Mean luma of the crop, in `[0, 1]`.
    pub brightness: f32,
    /// Variant that supplied the winning occurrence.
    pub variant: String,
}

impl FusedRegion {
    pub fn rect(&self) -> PixelRect {
        PixelRect {
            x_min: self.x_min,
            y_min: self.y_min,
            x_max: self.x_max,
            y_max: self.y_max,
        }
    }
}

/// Terminal outcome of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Legible text in a single font; downstream matching may proceed.
    Accepted,
    /// Quality gate failed.
    NoText,
    /// Text present but rendered in visibly different fonts.
    MultipleFonts,
}

/// The value handed to characteristic extraction.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub has_text: bool,
    pub text_regions: Vec<FusedRegion>,
    pub multiple_fonts: bool,
    /// Average confidence over `text_regions`.
    pub confidence: f32,
    /// Region texts joined by single spaces, in fusion order.
    pub text_content: String,
    pub regions_count: usize,
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Result for an analysis that could not run at all.
    pub fn from_error(err: &GlyphgateError) -> Self {
        let error = match err {
            GlyphgateError::NoTextDetected(failure) => failure.diagnostic().to_string(),
            other => other.to_string(),
        };
        Self {
            has_text: false,
            text_regions: Vec::new(),
            multiple_fonts: false,
            confidence: 0.0,
            text_content: String::new(),
            regions_count: 0,
            error: Some(error),
        }
    }

    pub fn outcome(&self) -> Outcome {
        if !self.has_text {
            Outcome::NoText
        } else if self.multiple_fonts {
            Outcome::MultipleFonts
        } else {
            Outcome::Accepted
        }
    }

    /// Turn business outcomes into errors, for callers that must stop before
    /// font matching unless the image was accepted.
    pub fn into_gate(self) -> Result<Self> {
        match self.outcome() {
            Outcome::Accepted => Ok(self),
            Outcome::MultipleFonts => Err(GlyphgateError::AmbiguousFonts),
            Outcome::NoText => match self.error.as_deref() {
                None => Err(GlyphgateError::NoTextDetected(GateFailure::NoTextFound)),
                Some(msg) => match GateFailure::from_diagnostic(msg) {
                    Some(failure) => Err(GlyphgateError::NoTextDetected(failure)),
                    None => Err(GlyphgateError::EngineError(msg.to_string())),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted() -> AnalysisResult {
        AnalysisResult {
            has_text: true,
            text_regions: Vec::new(),
            multiple_fonts: false,
            confidence: 0.9,
            text_content: "HELLO WORLD".into(),
            regions_count: 2,
            error: None,
        }
    }

    #[test]
    fn diagnostics_round_trip() {
        for failure in [
            GateFailure::NoTextFound,
            GateFailure::TextTooShort,
            GateFailure::ConfidenceTooLow,
            GateFailure::NotEnoughLetters,
        ] {
            assert_eq!(GateFailure::from_diagnostic(failure.diagnostic()), Some(failure));
        }
        assert_eq!(GateFailure::from_diagnostic("blurry"), None);
    }

    #[test]
    fn accepted_result_passes_gate() {
        let result = accepted();
        assert_eq!(result.outcome(), Outcome::Accepted);
        assert!(result.into_gate().is_ok());
    }

    #[test]
    fn multiple_fonts_becomes_ambiguous() {
        let result = AnalysisResult {
            multiple_fonts: true,
            ..accepted()
        };
        assert!(matches!(result.into_gate(), Err(GlyphgateError::AmbiguousFonts)));
    }

    #[test]
    fn no_text_keeps_specific_diagnostic() {
        let result = AnalysisResult::from_error(&GlyphgateError::NoTextDetected(
            GateFailure::ConfidenceTooLow,
        ));
        assert_eq!(result.error.as_deref(), Some("confidence too low"));
        assert!(matches!(
            result.into_gate(),
            Err(GlyphgateError::NoTextDetected(GateFailure::ConfidenceTooLow))
        ));
    }

    #[test]
    fn engine_errors_are_not_mistaken_for_gate_failures() {
        let result =
            AnalysisResult::from_error(&GlyphgateError::EngineUnavailable("model missing".into()));
        assert!(!result.has_text);
        assert!(matches!(result.into_gate(), Err(GlyphgateError::EngineError(_))));
    }

    #[test]
    fn serialized_result_omits_pixels() {
        let json = serde_json::to_value(accepted()).unwrap();
        assert_eq!(json["regions_count"], 2);
        assert!(json["error"].is_null());
    }
}
