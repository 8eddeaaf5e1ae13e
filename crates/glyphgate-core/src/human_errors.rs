// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people uploading an image to identify a
// font.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how an API layer or UI presents it.

use crate::error::GlyphgateError;
use crate::types::GateFailure;

/// Severity of an error from the uploader's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Busy queue or engine hiccup; trying again later should work.
    Transient,
    /// The uploader must do something (crop, re-photograph, pick one line).
    ActionRequired,
    /// Retrying cannot help (broken file, bad configuration).
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the uploader should try (shown as body text).
    pub suggestion: String,
    /// Whether the caller may retry automatically.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `GlyphgateError` into a `HumanError`.
pub fn humanize_error(err: &GlyphgateError) -> HumanError {
    match err {
        // -- Recognition engine --
        GlyphgateError::EngineUnavailable(detail) => HumanError {
            message: "Text recognition is not available right now.".into(),
            suggestion: format!("Please try again in a few minutes. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        GlyphgateError::EngineError(detail) | GlyphgateError::UnrecognizedShape(detail) => {
            HumanError {
                message: "Something went wrong while reading your image.".into(),
                suggestion: format!("Try uploading the image again. ({detail})"),
                retriable: true,
                severity: Severity::Transient,
            }
        }

        // -- Business outcomes --
        GlyphgateError::NoTextDetected(failure) => humanize_gate_failure(*failure),

        GlyphgateError::AmbiguousFonts => HumanError {
            message: "This image seems to use more than one font.".into(),
            suggestion: "Crop the image so it shows just one line or one style of text, then upload it again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Image handling --
        GlyphgateError::VariantFailure { .. } | GlyphgateError::ImageError(_) => HumanError {
            message: "We couldn't open this image.".into(),
            suggestion: "Save it as a PNG or JPEG and upload it again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Recognition queue --
        GlyphgateError::QueueFull | GlyphgateError::QueueTimeout => HumanError {
            message: "We're busy reading other images.".into(),
            suggestion: "Please wait a moment and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        GlyphgateError::WorkerStopped => HumanError {
            message: "Text recognition has stopped.".into(),
            suggestion: "The service needs to be restarted.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Configuration --
        GlyphgateError::InvalidConfig(detail) | GlyphgateError::UnknownPreset(detail) => {
            HumanError {
                message: "The service is misconfigured.".into(),
                suggestion: format!("Check the configuration file. ({detail})"),
                retriable: false,
                severity: Severity::Permanent,
            }
        }

        // -- Storage / serialization --
        GlyphgateError::Io(e) => HumanError {
            message: "We couldn't read a file.".into(),
            suggestion: format!("Check the file exists and can be opened. ({e})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        GlyphgateError::Serialization(e) => HumanError {
            message: "Some data was in an unexpected format.".into(),
            suggestion: format!("Check the file is valid JSON. ({e})"),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_gate_failure(failure: GateFailure) -> HumanError {
    let (message, suggestion) = match failure {
        GateFailure::NoTextFound => (
            "We couldn't find any text in this image.",
            "Upload an image where the lettering is clearly visible.",
        ),
        GateFailure::TextTooShort => (
            "There isn't enough text to identify a font.",
            "Try an image with at least a few letters, ideally a whole word.",
        ),
        GateFailure::ConfidenceTooLow => (
            "The text in this image is too hard to read.",
            "Use a sharper, better-lit image and crop closely around the text.",
        ),
        GateFailure::NotEnoughLetters => (
            "This image has too few letters.",
            "Fonts are easiest to identify from words, not just numbers or symbols.",
        ),
    };
    HumanError {
        message: message.into(),
        suggestion: suggestion.into(),
        retriable: false,
        severity: Severity::ActionRequired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_unavailable_is_transient() {
        let human = humanize_error(&GlyphgateError::EngineUnavailable("probe failed".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
        assert!(human.suggestion.contains("probe failed"));
    }

    #[test]
    fn blurry_image_is_action_required() {
        let human = humanize_error(&GlyphgateError::NoTextDetected(GateFailure::ConfidenceTooLow));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn each_gate_failure_has_its_own_message() {
        let messages: std::collections::HashSet<String> = [
            GateFailure::NoTextFound,
            GateFailure::TextTooShort,
            GateFailure::ConfidenceTooLow,
            GateFailure::NotEnoughLetters,
        ]
        .into_iter()
        .map(|f| humanize_error(&GlyphgateError::NoTextDetected(f)).message)
        .collect();
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn full_queue_is_retriable() {
        assert!(humanize_error(&GlyphgateError::QueueFull).retriable);
        assert!(humanize_error(&GlyphgateError::QueueTimeout).retriable);
    }

    #[test]
    fn bad_config_is_permanent() {
        let human = humanize_error(&GlyphgateError::UnknownPreset("sensitivity 'loose'".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }
}
