//! In-memory [`ContainerEngine`] and [`Observer`] fakes for testing, gated
//! behind the `test-support` feature.
//!
//! Grounded on the teacher's consistent `Fake*Adapter` pattern
//! (`oj-adapters::{notify,session,agent}::fake`): a `Clone`-able handle
//! around `Arc<Mutex<State>>` recording calls and returning pre-scripted
//! responses, rather than a trait-object mock framework.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crucible_core::engine_trait::{AttachedStream, ContainerConfig, EngineMessage, RawContainerState};
use crucible_core::{ContainerEngine, ContainerId, EngineError, Observer, StreamId, TimeoutError, VolumeId};

/// A scripted outcome for one container's lifecycle, installed ahead of
/// time via [`FakeEngine::script`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedOutcome {
    pub exit_code: i64,
    pub oom_killed: bool,
    /// If `true`, `wait` blocks until [`FakeEngine::NEVER`] elapses,
    /// forcing the caller's watchdog to classify this a `cpu_limit`.
    pub hangs: bool,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

struct FakeEngineState {
    next_id: u64,
    containers: std::collections::HashMap<String, ContainerRecord>,
    volumes: std::collections::HashSet<String>,
    scripts: VecDeque<ScriptedOutcome>,
    default_outcome: ScriptedOutcome,
    created_names: Vec<String>,
}

struct ContainerRecord {
    config: ContainerConfig,
    outcome: ScriptedOutcome,
    deleted: bool,
    archives: Vec<(String, Vec<u8>)>,
}

/// Fake [`ContainerEngine`] backed by an in-memory map, for tests that must
/// not talk to a real Docker daemon.
pub struct FakeEngine {
    state: Mutex<FakeEngineState>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            state: Mutex::new(FakeEngineState {
                next_id: 0,
                containers: std::collections::HashMap::new(),
                volumes: std::collections::HashSet::new(),
                scripts: VecDeque::new(),
                default_outcome: ScriptedOutcome {
                    exit_code: 0,
                    ..Default::default()
                },
                created_names: Vec::new(),
            }),
        }
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an outcome to be applied, in order, to each successively
    /// created container. Once the queue is drained, new containers get
    /// the zero-exit-code default.
    pub fn script(&self, outcome: ScriptedOutcome) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).scripts.push_back(outcome);
    }

    pub fn created_container_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .created_names
            .clone()
    }

    pub fn is_deleted(&self, container: &ContainerId) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .containers
            .get(container.as_str())
            .map(|r| r.deleted)
            .unwrap_or(true)
    }

    pub fn archives_written(&self, container: &ContainerId) -> Vec<(String, Vec<u8>)> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .containers
            .get(container.as_str())
            .map(|r| r.archives.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn create_container(
        &self,
        config: ContainerConfig,
        name: &str,
    ) -> Result<ContainerId, EngineError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.containers.contains_key(name) {
            return Err(EngineError::new(format!("name conflict: {name}")));
        }
        state.next_id += 1;
        let id = format!("fake-container-{}", state.next_id);
        let outcome = state.scripts.pop_front().unwrap_or_else(|| state.default_outcome.clone());
        state.containers.insert(
            id.clone(),
            ContainerRecord {
                config,
                outcome,
                deleted: false,
                archives: Vec::new(),
            },
        );
        state.created_names.push(name.to_string());
        Ok(ContainerId::new(id))
    }

    async fn start(&self, container: &ContainerId) -> Result<(), EngineError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.containers.contains_key(container.as_str()) {
            return Err(EngineError::new("no such container"));
        }
        Ok(())
    }

    /// Mirrors the real engine's contract: resolves immediately for a
    /// scripted container that has "already exited", or never resolves
    /// for one scripted to hang — in which case the `timeout` bound below
    /// fires and this returns `TimeoutError`, exactly as a real daemon's
    /// wait call would once `limits.time` elapses.
    async fn wait(&self, container: &ContainerId, timeout: Duration) -> Result<(), TimeoutError> {
        let hangs = {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state
                .containers
                .get(container.as_str())
                .map(|r| r.outcome.hangs)
                .unwrap_or(false)
        };
        if !hangs {
            return Ok(());
        }
        tokio::time::timeout(timeout, std::future::pending::<()>())
            .await
            .map_err(|_| TimeoutError(timeout))
    }

    async fn kill(&self, container: &ContainerId) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.containers.get_mut(container.as_str()) {
            Some(record) => {
                record.outcome.hangs = false;
                Ok(())
            }
            None => Err(EngineError::new("no such container")),
        }
    }

    async fn delete(&self, container: &ContainerId, _force: bool) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.containers.get_mut(container.as_str()) {
            Some(record) => {
                record.deleted = true;
                Ok(())
            }
            None => Err(EngineError::new("no such container")),
        }
    }

    async fn inspect(&self, container: &ContainerId) -> Result<RawContainerState, EngineError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let record = state
            .containers
            .get(container.as_str())
            .ok_or_else(|| EngineError::new("no such container"))?;
        if record.deleted {
            return Err(EngineError::new("no such container"));
        }
        Ok(RawContainerState {
            status: if record.outcome.oom_killed {
                "oom".to_string()
            } else {
                "exited".to_string()
            },
            exit_code: Some(record.outcome.exit_code),
            oom_killed: record.outcome.oom_killed,
            running: false,
        })
    }

    async fn attach(&self, container: &ContainerId) -> Result<Box<dyn AttachedStream>, EngineError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let record = state
            .containers
            .get(container.as_str())
            .ok_or_else(|| EngineError::new("no such container"))?;

        let mut messages = VecDeque::new();
        for line in &record.outcome.stdout {
            messages.push_back(EngineMessage {
                stream: StreamId::Stdout,
                payload: line.as_bytes().to_vec(),
            });
        }
        for line in &record.outcome.stderr {
            messages.push_back(EngineMessage {
                stream: StreamId::Stderr,
                payload: line.as_bytes().to_vec(),
            });
        }
        Ok(Box::new(FakeAttachedStream { messages }))
    }

    async fn put_archive(
        &self,
        container: &ContainerId,
        directory: &str,
        tar_bytes: Vec<u8>,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let record = state
            .containers
            .get_mut(container.as_str())
            .ok_or_else(|| EngineError::new("no such container"))?;
        record.archives.push((directory.to_string(), tar_bytes));
        Ok(())
    }

    async fn create_volume(&self, name: &str, _driver: &str) -> Result<VolumeId, EngineError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.volumes.insert(name.to_string()) {
            return Err(EngineError::new(format!("volume name conflict: {name}")));
        }
        Ok(VolumeId::new(name))
    }

    async fn delete_volume(&self, volume: &VolumeId) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.volumes.remove(volume.as_str());
        Ok(())
    }

    async fn log(&self, container: &ContainerId, stdout: bool, stderr: bool) -> Result<Vec<String>, EngineError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let record = state
            .containers
            .get(container.as_str())
            .ok_or_else(|| EngineError::new("no such container"))?;
        let mut lines = Vec::new();
        if stdout {
            lines.extend(record.outcome.stdout.iter().cloned());
        }
        if stderr {
            lines.extend(record.outcome.stderr.iter().cloned());
        }
        Ok(lines)
    }
}

struct FakeAttachedStream {
    messages: VecDeque<EngineMessage>,
}

#[async_trait]
impl AttachedStream for FakeAttachedStream {
    async fn write_stdin(&mut self, _data: &[u8]) -> Result<(), EngineError> {
        Ok(())
    }

    async fn read_message(&mut self) -> Result<Option<EngineMessage>, EngineError> {
        Ok(self.messages.pop_front())
    }
}

/// Fake [`Observer`] recording delivered output and replaying a scripted
/// stdin sequence.
pub struct FakeObserver {
    stdin: Mutex<VecDeque<String>>,
    stdout: Mutex<String>,
    stderr: Mutex<String>,
}

impl FakeObserver {
    pub fn new(stdin: Vec<String>) -> Self {
        Self {
            stdin: Mutex::new(stdin.into()),
            stdout: Mutex::new(String::new()),
            stderr: Mutex::new(String::new()),
        }
    }

    pub fn collected_stdout(&self) -> String {
        self.stdout.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn collected_stderr(&self) -> String {
        self.stderr.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Observer for FakeObserver {
    async fn next_stdin(&self) -> Option<String> {
        self.stdin.lock().unwrap_or_else(|e| e.into_inner()).pop_front()
    }

    async fn write_output(&self, _key: &str, data: &str, stream: StreamId) {
        match stream {
            StreamId::Stdout => self.stdout.lock().unwrap_or_else(|e| e.into_inner()).push_str(data),
            StreamId::Stderr => self.stderr.lock().unwrap_or_else(|e| e.into_inner()).push_str(data),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
