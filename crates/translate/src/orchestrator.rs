//! Bounded-concurrency fan-out of transform calls.

use futures::future::join_all;
use restyle_core::{PipelineConfig, StyleProfile, TextUnit, TranslationResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::transform::{TextTransform, TransformError};

/// Emitted once for every unit that finishes, in completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Units finished so far in this batch, including this one.
    pub completed: usize,
    /// Units in the batch.
    pub total: usize,
    /// Whether this unit's transform succeeded.
    pub succeeded: bool,
}

/// Callback receiving [`ProgressEvent`]s.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Runs the transform over a batch of units.
///
/// At most `max_concurrent_requests` calls are in flight at once. The limit
/// belongs to the orchestrator, so batches started concurrently from clones
/// of the same orchestrator share it.
#[derive(Clone)]
pub struct TranslationOrchestrator {
    transform: Arc<dyn TextTransform>,
    semaphore: Arc<Semaphore>,
    max_concurrent_requests: usize,
    timeout: Duration,
    progress: Option<ProgressCallback>,
}

impl TranslationOrchestrator {
    /// Create an orchestrator with the default timeout.
    pub fn new(transform: Arc<dyn TextTransform>, max_concurrent_requests: usize) -> Self {
        let limit = max_concurrent_requests.max(1);
        Self {
            transform,
            semaphore: Arc::new(Semaphore::new(limit)),
            max_concurrent_requests: limit,
            timeout: PipelineConfig::default().request_timeout(),
            progress: None,
        }
    }

    /// Create an orchestrator from pipeline configuration.
    pub fn from_config(transform: Arc<dyn TextTransform>, config: &PipelineConfig) -> Self {
        Self::new(transform, config.max_concurrent_requests).with_timeout(config.request_timeout())
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report every finished unit to `callback`.
    pub fn with_progress(
        mut self,
        callback: impl Fn(ProgressEvent) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Concurrency limit in effect.
    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    /// Transform every unit, returning one result per unit in input order.
    ///
    /// Blank units are never submitted. A failed, timed-out, empty or
    /// panicking call keeps the unit's original text and marks it failed;
    /// it never affects other units.
    pub async fn translate(
        &self,
        units: &[TextUnit],
        profile: StyleProfile,
    ) -> Vec<TranslationResult> {
        let total = units.len();
        let completed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = units
            .iter()
            .map(|unit| {
                let original = unit.content.clone();
                let transform = Arc::clone(&self.transform);
                let semaphore = Arc::clone(&self.semaphore);
                let completed = Arc::clone(&completed);
                let progress = self.progress.clone();
                let timeout = self.timeout;

                tokio::spawn(async move {
                    let result = if original.trim().is_empty() {
                        TranslationResult::unchanged(original, true)
                    } else {
                        let call =
                            call_transform(&*transform, &semaphore, &original, profile, timeout);
                        match call.await {
                            Ok(translated) => TranslationResult::success(original, translated),
                            Err(e) => {
                                log::warn!("Failed to transform {:?}: {}", original, e);
                                TranslationResult::unchanged(original, false)
                            }
                        }
                    };

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(callback) = progress {
                        callback(ProgressEvent {
                            completed: done,
                            total,
                            succeeded: result.succeeded,
                        });
                    }
                    result
                })
            })
            .collect();

        let results: Vec<TranslationResult> = join_all(handles)
            .await
            .into_iter()
            .zip(units)
            .map(|(joined, unit)| {
                joined.unwrap_or_else(|e| {
                    let err = TransformError::Aborted(e.to_string());
                    log::warn!("Failed to transform {:?}: {}", unit.content, err);
                    TranslationResult::unchanged(unit.content.clone(), false)
                })
            })
            .collect();

        let failed = results.iter().filter(|r| !r.succeeded).count();
        log::info!(
            "Transformed {} units ({} failed, profile {})",
            total,
            failed,
            profile
        );

        results
    }

    /// Transform one text under the same bound, timeout and empty-response
    /// rules as a batch, returning the error instead of falling back.
    pub async fn transform_one(
        &self,
        text: &str,
        profile: StyleProfile,
    ) -> Result<String, TransformError> {
        call_transform(&*self.transform, &self.semaphore, text, profile, self.timeout).await
    }
}

impl std::fmt::Debug for TranslationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationOrchestrator")
            .field("transform", &self.transform)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// One attempt, holding a permit for its whole duration.
async fn call_transform(
    transform: &dyn TextTransform,
    semaphore: &Semaphore,
    text: &str,
    profile: StyleProfile,
    timeout: Duration,
) -> Result<String, TransformError> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|e| TransformError::Aborted(e.to_string()))?;

    let translated = tokio::time::timeout(timeout, transform.transform(text, profile))
        .await
        .map_err(|_| TransformError::Timeout(timeout))??;

    let translated = translated.trim();
    if translated.is_empty() {
        return Err(TransformError::EmptyResponse);
    }

    Ok(translated.to_string())
}
