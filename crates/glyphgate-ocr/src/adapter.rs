// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine adapter — classify whatever JSON an engine returned into one of the
// known result shapes, then normalise every record into a `RawDetection` in
// source-image coordinates.
//
// Known shapes:
//
// - tuple list: `[[bbox, [text, conf]], …]`, `[[bbox, text], …]` or
//   `[[bbox, text, conf], …]`, optionally wrapped in one list per page;
// - parallel arrays: `{"rec_texts": […], "rec_scores": […], "rec_polys": […]}`
//   (or `dt_polys` / `rec_boxes` for geometry), alone or one dict per page.
//
// `null` and empty lists mean "nothing found". Everything else is an
// `UnrecognizedShape` error, never a silent empty result.

use std::panic::{AssertUnwindSafe, catch_unwind};

use glyphgate_core::error::{GlyphgateError, Result};
use glyphgate_core::geometry::BoundingShape;
use glyphgate_core::types::RawDetection;
use glyphgate_vision::ImageVariant;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::engine::RecognitionEngine;

/// Confidence given to records that carry text but no score.
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

/// Keys holding geometry in the parallel-array shape, in preference order.
const POLYGON_KEYS: [&str; 3] = ["rec_polys", "dt_polys", "rec_boxes"];

/// Engine output after shape classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// One JSON value per record.
    TupleList(Vec<Value>),
    /// Parallel columns; index `i` of each describes record `i`.
    ParallelArrays {
        texts: Vec<Value>,
        scores: Vec<Value>,
        polygons: Vec<Value>,
    },
}

/// One normalised record, still in the coordinate space of its variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub shape: BoundingShape,
    pub text: String,
    pub confidence: f32,
}

impl RawResult {
    /// Decide which known shape `value` has.
    pub fn classify(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::TupleList(Vec::new())),
            Value::Object(map) => Self::from_dict(&map),
            Value::Array(items) => Self::from_list(items),
            other => Err(GlyphgateError::UnrecognizedShape(format!(
                "expected a list or an object, got {}",
                kind_of(&other)
            ))),
        }
    }

    fn from_list(items: Vec<Value>) -> Result<Self> {
        if items.is_empty() {
            return Ok(Self::TupleList(Vec::new()));
        }

        // A flat record list; non-record entries are dropped during
        // normalisation rather than failing the batch.
        if items.iter().any(is_record) {
            return Ok(Self::TupleList(items));
        }

        // One dict per page.
        if items.iter().all(|v| v.is_object() || v.is_null()) {
            let mut merged = Self::empty_arrays();
            for page in items.iter().filter_map(Value::as_object) {
                merged.extend(Self::from_dict(page)?);
            }
            return Ok(merged);
        }

        // One list per page.
        if items.iter().all(|v| v.is_array() || v.is_null()) {
            let mut merged = Self::TupleList(Vec::new());
            for page in items {
                merged.extend(Self::classify(page)?);
            }
            return Ok(merged);
        }

        Err(GlyphgateError::UnrecognizedShape(format!(
            "list of {} entries contains no recognizable record",
            items.len()
        )))
    }

    fn from_dict(map: &Map<String, Value>) -> Result<Self> {
        let Some(texts) = map.get("rec_texts").and_then(Value::as_array) else {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            return Err(GlyphgateError::UnrecognizedShape(format!(
                "object without a rec_texts array (keys: {})",
                keys.join(", ")
            )));
        };
        let scores = map
            .get("rec_scores")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let polygons = POLYGON_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default();
        Ok(Self::ParallelArrays {
            texts: texts.clone(),
            scores,
            polygons,
        })
    }

    fn empty_arrays() -> Self {
        Self::ParallelArrays {
            texts: Vec::new(),
            scores: Vec::new(),
            polygons: Vec::new(),
        }
    }

    /// Append another page. Mixed shapes fall back to a tuple list with the
    /// parallel columns re-zipped into `[bbox, [text, score]]` records.
    fn extend(&mut self, other: Self) {
        match (self, other) {
            (Self::TupleList(a), Self::TupleList(b)) => a.extend(b),
            (
                Self::ParallelArrays {
                    texts,
                    scores,
                    polygons,
                },
                Self::ParallelArrays {
                    texts: t,
                    scores: s,
                    polygons: p,
                },
            ) => {
                // Keep columns aligned when a page has fewer scores or polygons.
                let base = texts.len();
                scores.resize(base, Value::Null);
                polygons.resize(base, Value::Null);
                texts.extend(t);
                scores.extend(s);
                polygons.extend(p);
            }
            (this, mut other) => {
                let mut records = this.take_records();
                records.extend(other.take_records());
                *this = Self::TupleList(records);
            }
        }
    }

    fn take_records(&mut self) -> Vec<Value> {
        match std::mem::replace(self, Self::TupleList(Vec::new())) {
            Self::TupleList(records) => records,
            Self::ParallelArrays {
                texts,
                scores,
                polygons,
            } => texts
                .into_iter()
                .enumerate()
                .map(|(i, text)| {
                    let score = scores.get(i).cloned().unwrap_or(Value::Null);
                    let polygon = polygons.get(i).cloned().unwrap_or(Value::Null);
                    Value::Array(vec![polygon, Value::Array(vec![text, score])])
                })
                .collect(),
        }
    }

    /// Number of candidate records before normalisation.
    pub fn len(&self) -> usize {
        match self {
            Self::TupleList(records) => records.len(),
            Self::ParallelArrays { texts, .. } => texts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Turn every usable record into a [`ParsedRecord`]. Records without text
    /// are skipped; records with broken geometry keep a `Malformed` shape.
    pub fn normalize(&self) -> Vec<ParsedRecord> {
        match self {
            Self::TupleList(records) => records.iter().filter_map(parse_tuple).collect(),
            Self::ParallelArrays {
                texts,
                scores,
                polygons,
            } => texts
                .iter()
                .enumerate()
                .filter_map(|(i, text)| {
                    let text = text.as_str().map(str::trim).filter(|t| !t.is_empty())?;
                    let confidence = scores.get(i).map_or(DEFAULT_CONFIDENCE, parse_confidence);
                    let shape = polygons
                        .get(i)
                        .map_or(BoundingShape::Malformed, BoundingShape::from_value);
                    Some(ParsedRecord {
                        shape,
                        text: text.to_string(),
                        confidence,
                    })
                })
                .collect(),
        }
    }
}

/// Runs the engine on variants and maps results back to the source image.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineAdapter;

impl EngineAdapter {
    /// Detect on one variant, absorbing every failure into an empty list.
    pub fn detect_variant(
        &self,
        engine: &mut dyn RecognitionEngine,
        variant: &ImageVariant,
    ) -> Vec<RawDetection> {
        match self.try_detect_variant(engine, variant) {
            Ok(detections) => detections,
            Err(err) => {
                warn!(label = variant.label, error = %err, "Variant produced no detections");
                Vec::new()
            }
        }
    }

    /// Detect on one variant, reporting why it failed.
    ///
    /// Engine panics are caught and reported as `EngineError`.
    #[instrument(skip_all, fields(label = variant.label, engine = engine.name()))]
    pub fn try_detect_variant(
        &self,
        engine: &mut dyn RecognitionEngine,
        variant: &ImageVariant,
    ) -> Result<Vec<RawDetection>> {
        let raw = catch_unwind(AssertUnwindSafe(|| engine.detect(&variant.image)))
            .map_err(|_| GlyphgateError::EngineError("recognition engine panicked".into()))??;

        let classified = RawResult::classify(raw)?;
        let records = classified.normalize();
        debug!(
            candidates = classified.len(),
            usable = records.len(),
            "Engine output normalised"
        );

        Ok(records
            .into_iter()
            .map(|record| {
                let shape = record.shape.unscale(variant.scale_x, variant.scale_y);
                RawDetection {
                    rect: shape.to_rect(),
                    shape,
                    text: record.text,
                    confidence: record.confidence,
                    variant: variant.label.to_string(),
                }
            })
            .collect())
    }
}

/// `[bbox, …]` where the second element holds text.
fn is_record(value: &Value) -> bool {
    match value.as_array() {
        Some(items) if items.len() >= 2 => match &items[1] {
            Value::String(_) => true,
            Value::Array(info) => info.first().is_some_and(Value::is_string),
            Value::Object(info) => info.contains_key("text"),
            _ => false,
        },
        _ => false,
    }
}

fn parse_tuple(record: &Value) -> Option<ParsedRecord> {
    let items = record.as_array().filter(|items| items.len() >= 2)?;
    let (text, confidence) = match &items[1] {
        // [bbox, text] or [bbox, text, conf]
        Value::String(text) => (
            text.as_str(),
            items.get(2).map_or(DEFAULT_CONFIDENCE, parse_confidence),
        ),
        // [bbox, [text, conf]]
        Value::Array(info) => (
            info.first()?.as_str()?,
            info.get(1).map_or(DEFAULT_CONFIDENCE, parse_confidence),
        ),
        // [bbox, {"text": …, "confidence": …}]
        Value::Object(info) => (
            info.get("text")?.as_str()?,
            info.get("confidence")
                .or_else(|| info.get("score"))
                .map_or(DEFAULT_CONFIDENCE, parse_confidence),
        ),
        _ => return None,
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(ParsedRecord {
        shape: BoundingShape::from_value(&items[0]),
        text: text.to_string(),
        confidence,
    })
}

/// Numeric or numeric-string confidence clamped into `[0, 1]`; anything else
/// counts as zero.
fn parse_confidence(value: &Value) -> f32 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null => return DEFAULT_CONFIDENCE,
        _ => None,
    };
    match raw {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0) as f32,
        _ => 0.0,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
