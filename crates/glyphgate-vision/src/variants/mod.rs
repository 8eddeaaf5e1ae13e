// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Variant pipeline — enhancement primitives and the labelled variant catalogue
// fed to the recognition engine.

pub mod enhance;
pub mod generator;

pub use enhance::{HueBand, TextEnhancer, otsu_threshold, rgb_to_hsv};
pub use generator::{ImageVariant, VariantGenerator, VariantKind, VariantSet};
