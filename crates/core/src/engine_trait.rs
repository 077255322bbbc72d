//! The Engine Client Adapter's capability surface (spec §4.1).
//!
//! `crucible-core` defines this trait (not `crucible-adapters`) so that
//! [`crate::build_state::BuildState`] can hold one without creating a
//! dependency cycle — `crucible-adapters` depends on `crucible-core` to
//! implement it, not the other way around.

use std::time::Duration;

use async_trait::async_trait;

use crate::docker_profile::DockerProfile;
use crate::error::{EngineError, TimeoutError};
use crate::file::File;
use crate::id::{ContainerId, VolumeId};
use crate::mount::Mount;
use crate::observer::StreamId;

/// Composed container creation request (spec §6's "Container creation
/// config fields").
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub image: String,
    pub cmd: Vec<String>,
    pub working_dir: String,
    pub user: Option<String>,
    pub memory_bytes: u64,
    pub mounts: Vec<Mount>,
    /// `[SUPPLEMENT]` cpu ulimit (soft=hard=`limits.time` whole seconds),
    /// grounded on `runbox/docker/utils.py::ulimits`. `None` when limits
    /// carry no meaningful whole-second bound.
    pub cpu_ulimit_secs: Option<u64>,
}

/// Raw state returned by `inspect`, already narrowed to the fields
/// `SandboxState` needs. The adapter is the only place that knows the
/// engine's own field names (`Status`/`ExitCode`/`OOMKilled`, ...).
#[derive(Debug, Clone)]
pub struct RawContainerState {
    pub status: String,
    pub exit_code: Option<i64>,
    pub oom_killed: bool,
    pub running: bool,
}

/// One message delivered on an attached container's combined output
/// stream.
#[derive(Debug, Clone)]
pub struct EngineMessage {
    pub stream: StreamId,
    pub payload: Vec<u8>,
}

/// A live, full-duplex connection to a running container's stdin/stdout/stderr.
#[async_trait]
pub trait AttachedStream: Send {
    /// Writes raw bytes to the container's stdin.
    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), EngineError>;

    /// Reads the next output message, or `None` once the stream has
    /// closed (the container exited or was killed/deleted).
    async fn read_message(&mut self) -> Result<Option<EngineMessage>, EngineError>;
}

/// Thin capability surface over the container engine daemon (spec §2.1,
/// §4.1). Opaque to every layer above `crucible-adapters`.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn create_container(
        &self,
        config: ContainerConfig,
        name: &str,
    ) -> Result<ContainerId, EngineError>;

    async fn start(&self, container: &ContainerId) -> Result<(), EngineError>;

    /// Blocks until `container` terminates, or fails with `TimeoutError`
    /// if `timeout` elapses first. Must not kill on timeout — that is the
    /// caller's (the watchdog's) job.
    async fn wait(&self, container: &ContainerId, timeout: Duration) -> Result<(), TimeoutError>;

    async fn kill(&self, container: &ContainerId) -> Result<(), EngineError>;

    async fn delete(&self, container: &ContainerId, force: bool) -> Result<(), EngineError>;

    async fn inspect(&self, container: &ContainerId) -> Result<RawContainerState, EngineError>;

    async fn attach(
        &self,
        container: &ContainerId,
    ) -> Result<Box<dyn AttachedStream>, EngineError>;

    async fn put_archive(
        &self,
        container: &ContainerId,
        directory: &str,
        tar_bytes: Vec<u8>,
    ) -> Result<(), EngineError>;

    async fn create_volume(&self, name: &str, driver: &str) -> Result<VolumeId, EngineError>;

    async fn delete_volume(&self, volume: &VolumeId) -> Result<(), EngineError>;

    async fn log(
        &self,
        container: &ContainerId,
        stdout: bool,
        stderr: bool,
    ) -> Result<Vec<String>, EngineError>;
}

/// Builds the command resolution and memory accounting `SandboxBuilder`
/// needs, independent of any specific engine. Kept here since both the
/// production and fake adapters, and `crucible-engine`, need the same
/// file-name-from-profile logic without re-deriving it.
pub fn resolve_argv(
    profile: &DockerProfile,
    files: &[File],
) -> Result<Vec<String>, crate::docker_profile::ConfigError> {
    profile.resolve_argv(files)
}

#[cfg(test)]
#[path = "engine_trait_tests.rs"]
mod tests;
