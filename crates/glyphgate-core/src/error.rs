// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Glyphgate.

use thiserror::Error;

use crate::types::GateFailure;

/// Top-level error type for all Glyphgate operations.
#[derive(Debug, Error)]
pub enum GlyphgateError {
    // -- Recognition engine --
    #[error("recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("recognition engine call failed: {0}")]
    EngineError(String),

    #[error("unrecognized engine output shape: {0}")]
    UnrecognizedShape(String),

    // -- Business outcomes --
    #[error("no text detected: {0}")]
    NoTextDetected(GateFailure),

    #[error("image contains multiple different fonts")]
    AmbiguousFonts,

    // -- Image handling --
    #[error("image variant '{label}' failed: {reason}")]
    VariantFailure { label: String, reason: String },

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Recognition queue --
    #[error("recognition queue is full")]
    QueueFull,

    #[error("timed out waiting for a recognition queue slot")]
    QueueTimeout,

    #[error("recognition worker has stopped")]
    WorkerStopped,

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    // -- Storage / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GlyphgateError>;
