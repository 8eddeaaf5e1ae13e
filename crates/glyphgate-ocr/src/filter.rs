// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Noise filter — drop fused regions too weak or too small to be real text,
// once, before the quality gate and the discriminator both look at them.

use glyphgate_core::config::QualityConfig;
use glyphgate_core::types::FusedRegion;
use tracing::debug;

/// Regions with fewer characters are punctuation or recognizer noise.
pub const MIN_TEXT_CHARS: usize = 2;

/// Regions narrower or shorter than this (pixels) are specks.
pub const MIN_REGION_SIDE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFilter {
    pub min_confidence: f32,
    pub min_text_chars: usize,
    pub min_side: u32,
}

impl NoiseFilter {
    pub fn new(quality: &QualityConfig) -> Self {
        Self {
            min_confidence: quality.min_confidence,
            min_text_chars: MIN_TEXT_CHARS,
            min_side: MIN_REGION_SIDE,
        }
    }

    pub fn passes(&self, region: &FusedRegion) -> bool {
        region.confidence >= self.min_confidence
            && region.text.chars().count() >= self.min_text_chars
            && region.width >= self.min_side
            && region.height >= self.min_side
    }

    pub fn apply(&self, regions: Vec<FusedRegion>) -> Vec<FusedRegion> {
        let before = regions.len();
        let kept: Vec<FusedRegion> = regions
            .into_iter()
            .filter(|region| {
                let keep = self.passes(region);
                if !keep {
                    debug!(
                        text = %region.text,
                        confidence = region.confidence,
                        width = region.width,
                        height = region.height,
                        "Region dropped as noise"
                    );
                }
                keep
            })
            .collect();
        debug!(before, after = kept.len(), "Noise filter applied");
        kept
    }
}
