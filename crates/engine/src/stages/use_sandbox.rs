//! Creates, runs, attaches to, and classifies a sandbox (spec §4.7).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crucible_core::build_state::BuildState;
use crucible_core::shared::SharedValue;
use crucible_core::{DockerProfile, File, Limits, Observer, StageError, StageParams};

use crate::builder::SandboxBuilder;
use crate::sandbox::Sandbox;

#[derive(Debug, Clone, Deserialize)]
pub struct SandboxMountParams {
    pub key: String,
    pub bind: String,
    #[serde(default)]
    pub readonly: bool,
}

fn default_attach() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct UseSandboxParams {
    pub key: String,
    pub profile: DockerProfile,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub files: Vec<File>,
    #[serde(default)]
    pub mounts: Vec<SandboxMountParams>,
    #[serde(default = "default_attach")]
    pub attach: bool,
}

/// Creates a sandbox, runs it, optionally attaches an observer's stdin/
/// stdout/stderr via two independent listener tasks, waits for
/// termination, and classifies the outcome (memory limit, cpu limit,
/// non-zero exit, or success).
///
/// Grounded on `runbox/build_stages/stages.py::UseSandbox`, reimplemented
/// with `Option<Arc<Sandbox>>` instead of a nullable attribute and a pair
/// of `tokio::spawn`ed tasks in place of asyncio's separate reader/writer
/// tasks. `AttachedStream` exposes both halves on one object, so the two
/// tasks share it behind `Arc<Mutex<_>>` rather than owning a true
/// pre-split reader/writer pair — each task only ever holds the lock for
/// the duration of its own `read_message`/`write_stdin` call.
pub struct UseSandbox {
    params: UseSandboxParams,
    sandbox: Option<Arc<Sandbox>>,
    input_listener: Option<JoinHandle<()>>,
    output_listener: Option<JoinHandle<()>>,
    is_setup: bool,
    is_disposed: bool,
}

impl UseSandbox {
    pub fn new(params: UseSandboxParams) -> Self {
        Self {
            params,
            sandbox: None,
            input_listener: None,
            output_listener: None,
            is_setup: false,
            is_disposed: false,
        }
    }

    /// A serializable snapshot of this stage's params, attached to
    /// classification errors (spec §4.7 step 6, §7).
    fn params_snapshot(&self) -> StageParams {
        StageParams {
            key: self.params.key.clone(),
            profile: self.params.profile.clone(),
            limits: self.params.limits,
            files: self.params.files.clone(),
            mount_keys: self.params.mounts.iter().map(|m| m.key.clone()).collect(),
            attach: self.params.attach,
        }
    }
}

#[async_trait]
impl crucible_core::Stage for UseSandbox {
    fn key(&self) -> &str {
        &self.params.key
    }

    fn is_setup(&self) -> bool {
        self.is_setup
    }

    fn is_disposed(&self) -> bool {
        self.is_disposed
    }

    async fn setup(&mut self, state: &mut BuildState) -> Result<(), StageError> {
        self.is_setup = true;

        if self.params.attach && state.observer.is_none() {
            return Err(StageError::NoObserver {
                key: self.params.key.clone(),
            });
        }

        let mut builder = SandboxBuilder::new()
            .with_profile(self.params.profile.clone())
            .with_limits(self.params.limits)
            .add_files(self.params.files.clone());

        for mount in &self.params.mounts {
            let volume = state
                .shared
                .get(&mount.key)
                .and_then(|v| v.as_volume())
                .cloned()
                .ok_or_else(|| StageError::Other {
                    key: self.params.key.clone(),
                    message: format!("key '{}' is not a volume in shared state", mount.key),
                })?;
            builder = builder.mount(volume, mount.bind.clone(), mount.readonly);
        }

        let sandbox = builder.create(state.engine.clone(), Duration::from_secs(5)).await?;
        let stream = sandbox.run(None).await?;
        let sandbox = Arc::new(sandbox);
        self.sandbox = Some(sandbox.clone());

        if self.params.attach {
            let observer = state.observer.clone().ok_or_else(|| StageError::NoObserver {
                key: self.params.key.clone(),
            })?;
            let stream = Arc::new(Mutex::new(stream));

            // Output listener: consumes messages until the stream closes
            // (the container is killed/deleted), independent of whether
            // the input listener is still running.
            let output_stream = stream.clone();
            let output_observer = observer.clone();
            let output_key = self.params.key.clone();
            self.output_listener = Some(tokio::spawn(async move {
                loop {
                    let message = output_stream.lock().await.read_message().await;
                    match message {
                        Ok(Some(message)) => {
                            let text = String::from_utf8_lossy(&message.payload).into_owned();
                            output_observer.write_output(&output_key, &text, message.stream).await;
                        }
                        _ => break,
                    }
                }
            }));

            // Input listener: iterates the observer's stdin source until
            // it's exhausted or the stream rejects a write. Cancelled
            // eagerly by `dispose`; never awaited to natural completion
            // the way the output listener is.
            let input_stream = stream;
            self.input_listener = Some(tokio::spawn(async move {
                loop {
                    match observer.next_stdin().await {
                        Some(data) => {
                            if input_stream.lock().await.write_stdin(data.as_bytes()).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }));
        }

        sandbox.wait().await?;
        let result = sandbox.state().await?;

        if result.memory_limit {
            return Err(StageError::memory_limit(self.params_snapshot()));
        }
        if result.cpu_limit {
            return Err(StageError::cpu_limit(self.params_snapshot()));
        }
        if let Some(exit_code) = result.exit_code {
            if exit_code != 0 {
                return Err(StageError::non_zero_exit(self.params_snapshot(), exit_code));
            }
        }

        state
            .shared
            .insert(self.params.key.clone(), SharedValue::Sandbox(sandbox));
        Ok(())
    }

    async fn dispose(&mut self, state: &mut BuildState) -> Result<(), StageError> {
        self.is_disposed = true;
        state.shared.remove(&self.params.key);

        // Delete the container first: this closes the attached stream, so
        // the output listener below drains naturally instead of racing a
        // forced cancellation (spec §4.7, §9).
        let delete_result = match self.sandbox.take() {
            Some(sandbox) => sandbox.delete(false).await,
            None => Ok(()),
        };

        if let Some(handle) = self.input_listener.take() {
            handle.abort();
            let _ = handle.await;
        }
        if let Some(handle) = self.output_listener.take() {
            let _ = handle.await;
        }

        delete_result?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "use_sandbox_tests.rs"]
mod tests;
