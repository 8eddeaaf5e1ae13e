// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyphgate OCR — the text gate in front of font identification.
//
// Runs a recognition engine over many variants of one image, fuses what it
// finds, decides whether there is enough credible text, and whether that
// text was set in more than one typeface.

pub mod adapter;
pub mod discriminator;
pub mod engine;
pub mod filter;
pub mod fusion;
pub mod pipeline;
pub mod quality;
pub mod worker;

pub use adapter::{EngineAdapter, RawResult};
pub use discriminator::{DecisionReason, FontStatistics, FontVerdict, MultiFontDiscriminator};
pub use engine::{CommandEngine, RecognitionEngine, Reply, StaticEngine};
#[cfg(feature = "ocrs")]
pub use engine::{OcrModelConfig, OcrsEngine};
pub use filter::NoiseFilter;
pub use fusion::fuse_detections;
pub use pipeline::{AnalysisReport, Pipeline};
pub use quality::{GateReport, QualityGate};
pub use worker::{RecognitionWorker, WorkerStatus};
