//! Queue-driven pipeline front-end.
//!
//! `[SUPPLEMENT]` grounded on `runbox/build_stages/pipeline.py::AsyncBasePipeline`:
//! a variant that accepts `execute_group`/`finalize` requests through a
//! channel processed by a background task, exposing hooks instead of
//! requiring the caller to `.await` each call inline — useful for a caller
//! driving several pipelines concurrently from one event loop.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crucible_core::{Pipeline, StageError};

/// A request accepted by [`QueuedPipeline`]'s background worker.
#[derive(Debug, Clone)]
pub enum PipelineRequest {
    ExecuteGroup(String),
    Finalize,
}

/// Observer of a [`QueuedPipeline`]'s background worker outcomes, in place
/// of the inline `Result` a direct `Pipeline::execute_group`/`finalize`
/// call would return.
#[async_trait]
pub trait PipelineHooks: Send + Sync {
    async fn on_group_done(&self, group: &str);
    async fn on_group_failed(&self, group: &str, error: &StageError);
    async fn on_finalize(&self, result: &Result<(), StageError>);
}

/// Failure to enqueue a request — the background worker has already
/// stopped (its request channel was closed via [`QueuedPipeline::join`]).
#[derive(Debug, Error)]
#[error("queued pipeline worker is no longer accepting requests")]
pub struct QueueClosed;

/// Wraps a [`Pipeline`] with an `mpsc` request queue and a background
/// `tokio::spawn`ed worker that drains it sequentially, calling `hooks` for
/// each outcome. The wrapped pipeline is never driven concurrently with
/// itself — requests are processed one at a time, in submission order,
/// preserving §5's "stages setup/dispose strictly sequentially" guarantee.
pub struct QueuedPipeline {
    sender: mpsc::UnboundedSender<PipelineRequest>,
    worker: JoinHandle<Pipeline>,
}

impl QueuedPipeline {
    /// Spawns the background worker owning `pipeline`, and returns a handle
    /// for submitting requests.
    pub fn spawn(pipeline: Pipeline, hooks: std::sync::Arc<dyn PipelineHooks>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<PipelineRequest>();

        let worker = tokio::spawn(async move {
            let mut pipeline = pipeline;
            while let Some(request) = receiver.recv().await {
                match request {
                    PipelineRequest::ExecuteGroup(group) => match pipeline.execute_group(&group).await {
                        Ok(()) => hooks.on_group_done(&group).await,
                        Err(e) => hooks.on_group_failed(&group, &e).await,
                    },
                    PipelineRequest::Finalize => {
                        let result = pipeline.finalize().await;
                        hooks.on_finalize(&result).await;
                    }
                }
            }
            pipeline
        });

        Self { sender, worker }
    }

    /// Enqueues `execute_group(group)`; the outcome arrives via
    /// `on_group_done`/`on_group_failed`, not this call's return value.
    pub fn execute_group(&self, group: impl Into<String>) -> Result<(), QueueClosed> {
        self.sender.send(PipelineRequest::ExecuteGroup(group.into())).map_err(|_| QueueClosed)
    }

    /// Enqueues `finalize()`; the outcome arrives via `on_finalize`.
    pub fn finalize(&self) -> Result<(), QueueClosed> {
        self.sender.send(PipelineRequest::Finalize).map_err(|_| QueueClosed)
    }

    /// Closes the request queue and awaits the worker, handing back the
    /// underlying [`Pipeline`] once every already-submitted request has
    /// drained. `Err` only if the worker task itself panicked.
    pub async fn join(self) -> Result<Pipeline, tokio::task::JoinError> {
        let QueuedPipeline { sender, worker } = self;
        drop(sender);
        worker.await
    }
}

#[cfg(test)]
#[path = "queued_pipeline_tests.rs"]
mod tests;
