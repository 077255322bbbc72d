//! A stateful handle around one created container (spec §4.4).

use std::sync::Arc;
use std::time::Instant;

use crucible_adapters::packager::build_tarball;
use crucible_core::engine_trait::AttachedStream;
use crucible_core::sandbox_handle::SandboxRef;
use crucible_core::{ContainerEngine, ContainerId, EngineError, Limits, SandboxError, SandboxState};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::watchdog::Watchdog;

/// `created -> running -> terminated -> deleted` (spec §4.4). `kill` from
/// `running` forces `terminated` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Terminated,
    Deleted,
}

struct Inner {
    lifecycle: Lifecycle,
    cpu_limit: bool,
    watchdog: Option<Watchdog>,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
}

/// A single-use container handle owning its duplex stream lifecycle, its
/// timeout watchdog, and its termination classification.
///
/// Mutating operations take `&self` (not `&mut self`): a `Sandbox` is
/// published into [`crucible_core::SharedState`] as `Arc<dyn SandboxRef>`
/// once `UseSandbox::setup` succeeds (spec §3 "shared artifacts are
/// borrowed references"), so interior mutability is required for the
/// owning stage to still drive its lifecycle through the shared `Arc`.
pub struct Sandbox {
    container: ContainerId,
    engine: Arc<dyn ContainerEngine>,
    limits: Limits,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox").field("container", &self.container).finish()
    }
}

impl SandboxRef for Sandbox {}

impl Sandbox {
    pub fn new(container: ContainerId, engine: Arc<dyn ContainerEngine>, limits: Limits) -> Self {
        Self {
            container,
            engine,
            limits,
            inner: Mutex::new(Inner {
                lifecycle: Lifecycle::Created,
                cpu_limit: false,
                watchdog: None,
                started_at: None,
                finished_at: None,
            }),
        }
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.container
    }

    /// Starts the container, attaches a duplex stream, optionally writes
    /// `stdin` immediately, and starts the wall-clock watchdog. Fails with
    /// `SandboxError::AlreadyRunning` unless the sandbox is still
    /// `created`.
    pub async fn run(&self, stdin: Option<&[u8]>) -> Result<Box<dyn AttachedStream>, SandboxError> {
        {
            let inner = self.inner.lock().await;
            if inner.lifecycle != Lifecycle::Created {
                return Err(SandboxError::AlreadyRunning);
            }
        }

        self.engine.start(&self.container).await?;
        let mut stream = self.engine.attach(&self.container).await?;
        if let Some(data) = stdin {
            stream.write_stdin(data).await?;
        }

        let mut inner = self.inner.lock().await;
        inner.cpu_limit = false;
        inner.started_at = Some(Instant::now());
        inner.watchdog = Some(Watchdog::start(
            self.engine.clone(),
            self.container.clone(),
            self.limits.time,
        ));
        inner.lifecycle = Lifecycle::Running;
        info!(container = self.container.as_str(), "sandbox running");
        Ok(stream)
    }

    /// Blocks until the watchdog completes. A natural termination leaves
    /// `cpu_limit` false; a watchdog timeout kills the container
    /// (suppressing the race with a natural exit) and sets `cpu_limit`.
    /// Fails with `SandboxError::NotRunning` unless `run` was called.
    pub async fn wait(&self) -> Result<(), SandboxError> {
        let mut watchdog = {
            let mut inner = self.inner.lock().await;
            if inner.lifecycle != Lifecycle::Running {
                return Err(SandboxError::NotRunning);
            }
            inner.watchdog.take()
        };

        let timed_out = match watchdog.as_mut() {
            Some(w) => w.join().await.is_err(),
            None => false,
        };

        if timed_out {
            warn!(container = self.container.as_str(), limit_secs = self.limits.time.as_secs(), "watchdog killed container on timeout");
            // The kill may race a container that already exited on its
            // own; any engine error here is suppressed (spec §4.4, §9).
            let _ = self.engine.kill(&self.container).await;
        } else {
            info!(container = self.container.as_str(), "sandbox terminated naturally");
        }

        let mut inner = self.inner.lock().await;
        inner.cpu_limit = timed_out;
        inner.finished_at = Some(Instant::now());
        inner.lifecycle = Lifecycle::Terminated;
        Ok(())
    }

    /// Inspects the container and overlays this sandbox's own `cpu_limit`
    /// flag (the engine has no knowledge of the watchdog). Callable before
    /// or after `wait`.
    pub async fn state(&self) -> Result<SandboxState, EngineError> {
        let raw = self.engine.inspect(&self.container).await?;
        let inner = self.inner.lock().await;
        Ok(SandboxState {
            status: raw.status,
            exit_code: raw.exit_code,
            started_at: inner.started_at,
            finished_at: inner.finished_at,
            memory_limit: raw.oom_killed,
            cpu_limit: inner.cpu_limit,
        })
    }

    /// Buffered container logs, for callers that did not consume the live
    /// attached stream.
    pub async fn log(&self, stdout: bool, stderr: bool) -> Result<Vec<String>, EngineError> {
        self.engine.log(&self.container, stdout, stderr).await
    }

    pub async fn kill(&self) -> Result<(), EngineError> {
        self.engine.kill(&self.container).await?;
        let mut inner = self.inner.lock().await;
        if inner.lifecycle == Lifecycle::Running {
            inner.lifecycle = Lifecycle::Terminated;
        }
        Ok(())
    }

    pub async fn delete(&self, force: bool) -> Result<(), EngineError> {
        self.engine.delete(&self.container, force).await?;
        self.inner.lock().await.lifecycle = Lifecycle::Deleted;
        Ok(())
    }

    /// Thin wrapper over the file packager and `put_archive` (spec §4.4).
    pub async fn write_files(&self, directory: &str, files: &[crucible_core::File]) -> Result<(), EngineError> {
        let tar_bytes =
            build_tarball(files).map_err(|e| EngineError::new(format!("failed to build tarball: {e}")))?;
        self.engine.put_archive(&self.container, directory, tar_bytes).await
    }
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
