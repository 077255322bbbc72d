//! Immutable, chainable `Sandbox` specification assembler (spec §4.5).

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crucible_adapters::packager::build_tarball;
use crucible_core::engine_trait::ContainerConfig;
use crucible_core::{ConfigError, ContainerEngine, DockerProfile, EngineError, File, Limits, Mount, StageError, TimeoutError, VolumeId};

use crate::name_factory::{default_name_factory, NameFactory};
use crate::sandbox::Sandbox;

/// Errors from [`SandboxBuilder::create`]: either the `cmd_template` failed
/// to resolve against the file list, or the engine call (bounded by
/// `timeout`) failed or timed out.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

impl From<BuildError> for StageError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Config(e) => StageError::Config(e),
            BuildError::Engine(e) => StageError::Engine(e),
            BuildError::Timeout(e) => StageError::Timeout(e),
        }
    }
}

/// Immutable builder: every `with_*`/`add_*`/`mount` call returns a new
/// builder holding a shallow-copied mount and file list, matching
/// `runbox/docker/sandbox_builder.py::SandboxBuilder.copy`'s reasoning —
/// `DockerProfile`, `Limits`, `File`, and `Mount` are all immutable, so
/// copying the lists is all `with_*` needs to do to avoid aliasing the
/// original builder.
#[derive(Clone)]
pub struct SandboxBuilder {
    profile: Option<DockerProfile>,
    limits: Limits,
    files: Vec<File>,
    mounts: Vec<Mount>,
    name_factory: Arc<dyn NameFactory>,
}

impl Default for SandboxBuilder {
    fn default() -> Self {
        Self {
            profile: None,
            limits: Limits::default(),
            files: Vec::new(),
            mounts: Vec::new(),
            name_factory: default_name_factory(),
        }
    }
}

impl SandboxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: DockerProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn add_files(mut self, files: impl IntoIterator<Item = File>) -> Self {
        self.files.extend(files);
        self
    }

    pub fn mount(mut self, volume: VolumeId, bind: impl Into<String>, readonly: bool) -> Self {
        self.mounts.push(Mount::new(volume, bind, readonly));
        self
    }

    /// Substitutes the name factory (default: random dashed-hex UUID),
    /// for deterministic tests.
    pub fn with_name_factory(mut self, name_factory: Arc<dyn NameFactory>) -> Self {
        self.name_factory = name_factory;
        self
    }

    /// Composes the container creation config, allocates a unique name,
    /// creates the container under an overall `timeout` bound, deposits
    /// `files` into the working directory, and returns a [`Sandbox`]
    /// wrapping it with the watchdog deadline set to `limits.time`.
    pub async fn create(
        self,
        engine: Arc<dyn ContainerEngine>,
        timeout: Duration,
    ) -> Result<Sandbox, BuildError> {
        let profile = self
            .profile
            .clone()
            .ok_or_else(|| ConfigError::Invalid("no profile set on SandboxBuilder".to_string()))?;

        let cmd = profile.resolve_argv(&self.files)?;
        let config = ContainerConfig {
            image: profile.image.clone(),
            cmd,
            working_dir: profile.workdir.clone(),
            user: profile.user.clone(),
            memory_bytes: self.limits.memory_bytes(),
            mounts: self.mounts.clone(),
            cpu_ulimit_secs: Some(self.limits.time.as_secs()),
        };

        let name = self.name_factory.next_name();
        let container = tokio::time::timeout(timeout, engine.create_container(config, &name))
            .await
            .map_err(|_| TimeoutError(timeout))??;

        let tar_bytes = build_tarball(&self.files)
            .map_err(|e| EngineError::new(format!("failed to build tarball: {e}")))?;
        engine
            .put_archive(&container, &profile.workdir, tar_bytes)
            .await?;

        Ok(Sandbox::new(container, engine, self.limits))
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
