// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted engine that replays canned JSON. Used by tests, benches and dry runs.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glyphgate_core::error::{GlyphgateError, Result};
use image::DynamicImage;
use serde_json::Value;

use super::RecognitionEngine;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Fail(String),
    /// The engine goes down and stays down until reinitialised.
    Unavailable(String),
}

/// Engine that answers from a script instead of looking at the image.
///
/// Replies are consumed in call order; once the script runs out, `fallback`
/// answers every further call.
#[derive(Debug, Clone)]
pub struct StaticEngine {
    script: VecDeque<Reply>,
    fallback: Reply,
    available: bool,
    recover_on_reinit: bool,
    calls: Arc<AtomicUsize>,
}

impl StaticEngine {
    /// Every call returns `value`.
    pub fn always(value: Value) -> Self {
        Self::scripted(Vec::new(), Reply::Json(value))
    }

    /// Every call finds nothing.
    pub fn empty() -> Self {
        Self::always(Value::Array(Vec::new()))
    }

    pub fn scripted(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: script.into(),
            fallback,
            available: true,
            recover_on_reinit: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// An engine whose models failed to load. `reinitialize` brings it back
    /// only if `recovers` is true.
    pub fn unavailable(recovers: bool) -> Self {
        Self {
            available: false,
            recover_on_reinit: recovers,
            ..Self::empty()
        }
    }

    /// Shared counter of `detect` calls, readable after the engine has been
    /// moved onto a worker.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl RecognitionEngine for StaticEngine {
    fn name(&self) -> &str {
        "static"
    }

    fn detect(&mut self, _image: &DynamicImage) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(GlyphgateError::EngineUnavailable("static engine is down".into()));
        }
        match self.script.pop_front().unwrap_or_else(|| self.fallback.clone()) {
            Reply::Json(value) => Ok(value),
            Reply::Fail(reason) => Err(GlyphgateError::EngineError(reason)),
            Reply::Unavailable(reason) => {
                self.available = false;
                Err(GlyphgateError::EngineUnavailable(reason))
            }
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn reinitialize(&mut self) -> Result<()> {
        if self.recover_on_reinit {
            self.available = true;
            Ok(())
        } else {
            Err(GlyphgateError::EngineUnavailable(
                "static engine cannot be restored".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blank() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn script_then_fallback() {
        let mut engine = StaticEngine::scripted(
            vec![Reply::Json(json!([1])), Reply::Fail("boom".into())],
            Reply::Json(json!([])),
        );
        assert_eq!(engine.detect(&blank()).unwrap(), json!([1]));
        assert!(matches!(engine.detect(&blank()), Err(GlyphgateError::EngineError(_))));
        assert_eq!(engine.detect(&blank()).unwrap(), json!([]));
        assert_eq!(engine.detect(&blank()).unwrap(), json!([]));
        assert_eq!(engine.call_counter().load(Ordering::SeqCst), 4);
    }

    #[test]
    fn engine_stays_down_after_losing_its_models() {
        let mut engine = StaticEngine::scripted(
            vec![Reply::Unavailable("models evicted".into())],
            Reply::Json(json!([])),
        );
        assert!(matches!(engine.detect(&blank()), Err(GlyphgateError::EngineUnavailable(_))));
        assert!(!engine.is_available());
        assert!(matches!(engine.detect(&blank()), Err(GlyphgateError::EngineUnavailable(_))));
        engine.reinitialize().unwrap();
        assert_eq!(engine.detect(&blank()).unwrap(), json!([]));
    }

    #[test]
    fn unavailable_engine_recovers_only_when_allowed() {
        let mut down = StaticEngine::unavailable(false);
        assert!(!down.is_available());
        assert!(down.reinitialize().is_err());

        let mut flaky = StaticEngine::unavailable(true);
        flaky.reinitialize().unwrap();
        assert!(flaky.is_available());
    }
}
