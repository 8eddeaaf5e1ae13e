// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyphgate — Core types, geometry, configuration presets and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;
pub mod types;

pub use config::{
    AnalysisOptions, CONFIG_VERSION, ContentType, MultiFontConfig, PipelineConfig, QualityConfig,
    QueueConfig, Sensitivity, VariantConfig,
};
pub use error::GlyphgateError;
pub use geometry::{BoundingShape, PixelRect};
pub use types::*;
