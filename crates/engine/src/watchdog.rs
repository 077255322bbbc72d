//! The wall-clock timeout task that kills a running container when
//! `limits.time` elapses (spec §4.4, §9 "Timeout-race with natural exit").

use std::sync::Arc;

use crucible_core::{ContainerEngine, ContainerId, TimeoutError};
use tokio::task::JoinHandle;

/// A sibling task racing a container's natural termination against
/// `limits.time`. Started by [`crate::sandbox::Sandbox::run`], joined by
/// [`crate::sandbox::Sandbox::wait`].
pub struct Watchdog {
    handle: Option<JoinHandle<Result<(), TimeoutError>>>,
}

impl Watchdog {
    pub fn start(
        engine: Arc<dyn ContainerEngine>,
        container: ContainerId,
        timeout: std::time::Duration,
    ) -> Self {
        let handle = tokio::spawn(async move { engine.wait(&container, timeout).await });
        Self {
            handle: Some(handle),
        }
    }

    /// Awaits the watchdog's outcome. `Ok(Ok(()))` means the container
    /// terminated on its own; `Ok(Err(_))` means `limits.time` elapsed
    /// first. A second call after the first has consumed the handle is a
    /// no-op returning `Ok(Ok(()))`, matching the spec's "wait becomes a
    /// no-op if called again" note.
    pub async fn join(&mut self) -> Result<(), TimeoutError> {
        match self.handle.take() {
            None => Ok(()),
            // A task that was itself cancelled/panicked (never expected in
            // practice — the future only calls the engine adapter) is
            // treated as a natural termination rather than propagated,
            // since `Sandbox::wait` has no channel for a third outcome.
            Some(handle) => handle.await.unwrap_or(Ok(())),
        }
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
