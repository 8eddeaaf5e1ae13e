// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// glyphgate-vision — Image work for the Glyphgate text gate.
//
// Provides image decoding and intensity transforms, text enhancement primitives
// (binarization, CLAHE, morphology, accent-hue suppression), the deterministic
// variant catalogue handed to the recognition engine, and per-region appearance
// metrics (brightness, saturation, stroke density).

pub mod image;
pub mod region;
pub mod variants;

// Re-export the primary structs so callers can use `glyphgate_vision::VariantGenerator` etc.
pub use self::image::processor::ImageProcessor;
pub use region::{RegionSample, sample_region};
pub use variants::enhance::TextEnhancer;
pub use variants::generator::{ImageVariant, VariantGenerator, VariantKind, VariantSet};
