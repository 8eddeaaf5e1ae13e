// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-worker recognition queue.
//
// The engine is not reentrant, so one dedicated OS thread owns it together
// with the pipeline and serves jobs strictly one at a time. Async callers
// hand jobs over a bounded channel and await the answer on a oneshot.
// A full queue is refused (or waited on, up to a timeout) instead of
// growing without limit.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use glyphgate_core::config::AnalysisOptions;
use glyphgate_core::error::{GlyphgateError, Result};
use image::DynamicImage;
use serde::Serialize;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::engine::RecognitionEngine;
use crate::pipeline::{AnalysisReport, Pipeline};

enum Job {
    Analyze {
        id: Uuid,
        image: DynamicImage,
        options: AnalysisOptions,
        reply: oneshot::Sender<Result<AnalysisReport>>,
    },
    Reinitialize {
        id: Uuid,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// State the worker thread publishes for `status()`.
struct Shared {
    engine: String,
    available: AtomicBool,
    completed: AtomicU64,
    last_reinit: Mutex<Option<DateTime<Utc>>>,
}

/// Snapshot of the worker, backing a health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStatus {
    pub engine: String,
    pub available: bool,
    /// Jobs waiting in the queue, not counting the one running.
    pub queue_depth: usize,
    pub capacity: usize,
    pub completed_jobs: u64,
    pub last_reinit: Option<DateTime<Utc>>,
}

pub struct RecognitionWorker {
    sender: mpsc::Sender<Job>,
    shared: Arc<Shared>,
    submit_timeout: Option<Duration>,
    handle: Option<JoinHandle<()>>,
}

impl RecognitionWorker {
    /// Start the worker thread. The engine and pipeline move onto it.
    pub fn spawn(engine: Box<dyn RecognitionEngine>, pipeline: Pipeline) -> Result<Self> {
        let queue = pipeline.config().queue.clone();
        let (sender, receiver) = mpsc::channel(queue.capacity.max(1));
        let shared = Arc::new(Shared {
            engine: engine.name().to_string(),
            available: AtomicBool::new(engine.is_available()),
            completed: AtomicU64::new(0),
            last_reinit: Mutex::new(None),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("glyphgate-recognizer".into())
            .spawn(move || serve(engine, pipeline, receiver, thread_shared))?;

        info!(
            engine = %shared.engine,
            capacity = queue.capacity,
            submit_timeout_ms = queue.submit_timeout_ms,
            "Recognition worker started"
        );

        Ok(Self {
            sender,
            shared,
            submit_timeout: queue.submit_timeout_ms.map(Duration::from_millis),
            handle: Some(handle),
        })
    }

    /// Queue one analysis and wait for its report.
    pub async fn submit(
        &self,
        image: DynamicImage,
        options: AnalysisOptions,
    ) -> Result<AnalysisReport> {
        let id = Uuid::new_v4();
        let (reply, response) = oneshot::channel();
        self.enqueue(Job::Analyze {
            id,
            image,
            options,
            reply,
        })
        .await?;
        debug!(request_id = %id, "Analysis queued");
        response.await.map_err(|_| GlyphgateError::WorkerStopped)?
    }

    /// Drop and rebuild the engine's state, in turn with analysis jobs.
    pub async fn reinitialize(&self) -> Result<()> {
        let id = Uuid::new_v4();
        let (reply, response) = oneshot::channel();
        self.enqueue(Job::Reinitialize { id, reply }).await?;
        response.await.map_err(|_| GlyphgateError::WorkerStopped)?
    }

    pub fn status(&self) -> WorkerStatus {
        let last_reinit = *self
            .shared
            .last_reinit
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        WorkerStatus {
            engine: self.shared.engine.clone(),
            available: self.shared.available.load(Ordering::SeqCst),
            queue_depth: self.sender.max_capacity() - self.sender.capacity(),
            capacity: self.sender.max_capacity(),
            completed_jobs: self.shared.completed.load(Ordering::SeqCst),
            last_reinit,
        }
    }

    /// Close the queue, let queued jobs finish and join the thread.
    pub fn shutdown(self) {
        let Self { sender, handle, .. } = self;
        drop(sender);
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Recognition worker thread panicked");
            }
        }
    }

    async fn enqueue(&self, job: Job) -> Result<()> {
        match self.submit_timeout {
            None => self.sender.try_send(job).map_err(|err| match err {
                TrySendError::Full(_) => GlyphgateError::QueueFull,
                TrySendError::Closed(_) => GlyphgateError::WorkerStopped,
            }),
            Some(timeout) => self
                .sender
                .send_timeout(job, timeout)
                .await
                .map_err(|err| match err {
                    SendTimeoutError::Timeout(_) => GlyphgateError::QueueTimeout,
                    SendTimeoutError::Closed(_) => GlyphgateError::WorkerStopped,
                }),
        }
    }
}

/// Worker loop; returns once every sender is gone.
fn serve(
    mut engine: Box<dyn RecognitionEngine>,
    pipeline: Pipeline,
    mut receiver: mpsc::Receiver<Job>,
    shared: Arc<Shared>,
) {
    while let Some(job) = receiver.blocking_recv() {
        match job {
            Job::Analyze {
                id,
                image,
                options,
                reply,
            } => {
                let span = info_span!("analysis", request_id = %id);
                let _guard = span.enter();
                let outcome = pipeline.analyze(&mut *engine, &image, &options);
                if let Err(err) = &outcome {
                    warn!(error = %err, "Analysis failed");
                }
                shared.available.store(engine.is_available(), Ordering::SeqCst);
                shared.completed.fetch_add(1, Ordering::SeqCst);
                if reply.send(outcome).is_err() {
                    debug!("Caller went away before the report was ready");
                }
            }
            Job::Reinitialize { id, reply } => {
                let span = info_span!("reinitialize", request_id = %id);
                let _guard = span.enter();
                let outcome = engine.reinitialize();
                match &outcome {
                    Ok(()) => info!(engine = engine.name(), "Engine reinitialised"),
                    Err(err) => warn!(error = %err, "Engine reinitialisation failed"),
                }
                shared.available.store(engine.is_available(), Ordering::SeqCst);
                *shared
                    .last_reinit
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
                if reply.send(outcome).is_err() {
                    debug!("Caller went away before reinitialisation finished");
                }
            }
        }
    }
    info!("Recognition worker stopped");
}
