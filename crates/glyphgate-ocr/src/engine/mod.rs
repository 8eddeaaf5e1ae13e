// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition engine boundary.
//
// The engine is a black box: it takes one image and returns JSON in whatever
// shape its version happens to produce. Turning that into detections is the
// adapter's job, not the engine's.

pub mod command;
#[cfg(feature = "ocrs")]
pub mod ocrs;
pub mod static_engine;

use glyphgate_core::error::Result;
use image::DynamicImage;

pub use command::CommandEngine;
#[cfg(feature = "ocrs")]
pub use self::ocrs::{OcrModelConfig, OcrsEngine};
pub use static_engine::{Reply, StaticEngine};

/// A text detector/recognizer that can be probed and reloaded.
///
/// Implementations are not expected to be reentrant; the pipeline only ever
/// calls one from a single thread at a time.
pub trait RecognitionEngine: Send {
    /// Short name for logs and status reports.
    fn name(&self) -> &str;

    /// Run detection + recognition on one image and return the raw result.
    fn detect(&mut self, image: &DynamicImage) -> Result<serde_json::Value>;

    /// Whether the engine initialised and can currently serve requests.
    fn is_available(&self) -> bool;

    /// Drop and rebuild internal state (models, subprocess probe).
    fn reinitialize(&mut self) -> Result<()>;
}
