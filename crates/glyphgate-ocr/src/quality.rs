// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quality gate — decide whether enough credible text survived filtering to
// identify a font, and if not, say which check failed.

use glyphgate_core::config::QualityConfig;
use glyphgate_core::types::{FusedRegion, GateFailure};
use serde::Serialize;
use tracing::debug;

/// Everything the gate measured, plus its decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateReport {
    pub has_text: bool,
    pub valid_regions: usize,
    /// Region texts joined by spaces, reduced to alphanumerics and whitespace.
    pub clean_text: String,
    pub avg_confidence: f32,
    pub letters: usize,
    pub failure: Option<GateFailure>,
}

#[derive(Debug, Clone)]
pub struct QualityGate {
    config: QualityConfig,
}

impl QualityGate {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Checks run in order (region count, text length, average confidence,
    /// letter count) and the first failure is reported.
    pub fn evaluate(&self, regions: &[FusedRegion]) -> GateReport {
        let joined = regions
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let clean_text = clean_text(&joined);
        let text_length = clean_text.chars().count();
        let letters = clean_text.chars().filter(|c| c.is_alphabetic()).count();
        let avg_confidence = if regions.is_empty() {
            0.0
        } else {
            regions.iter().map(|r| r.confidence).sum::<f32>() / regions.len() as f32
        };

        let cfg = &self.config;
        let failure = if regions.len() < cfg.min_regions_count.max(1) {
            Some(GateFailure::NoTextFound)
        } else if text_length < cfg.min_text_length {
            Some(GateFailure::TextTooShort)
        } else if avg_confidence < cfg.min_avg_confidence {
            Some(GateFailure::ConfidenceTooLow)
        } else if letters < cfg.min_letters_count {
            Some(GateFailure::NotEnoughLetters)
        } else {
            None
        };

        debug!(
            valid_regions = regions.len(),
            text_length,
            letters,
            avg_confidence,
            failure = failure.map(|f| f.diagnostic()),
            "Quality gate evaluated"
        );

        GateReport {
            has_text: failure.is_none(),
            valid_regions: regions.len(),
            clean_text,
            avg_confidence,
            letters,
            failure,
        }
    }
}

/// Keep alphanumerics and whitespace, collapse runs of whitespace, trim.
pub fn clean_text(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
