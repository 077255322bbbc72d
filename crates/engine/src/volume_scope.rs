//! Scoped acquisition of a named ephemeral volume with guaranteed release
//! (spec §4.6).

use std::sync::Arc;
use std::time::Duration;

use crucible_core::{ContainerEngine, EngineError, VolumeId};

use crate::name_factory::NameFactory;

/// Owns one volume from `open` until `close`. There is no async `Drop` in
/// Rust, so — unlike the teacher's `@asynccontextmanager` — release is an
/// explicit method the owning stage calls from its own `dispose` (this is
/// exactly how [`crate::stages::use_volume::UseVolume`] drives it).
pub struct VolumeScope {
    engine: Arc<dyn ContainerEngine>,
    volume: Option<VolumeId>,
}

impl VolumeScope {
    /// Creates the volume (auto-named if `name` is `None`), bounded by
    /// `timeout`.
    pub async fn open(
        engine: Arc<dyn ContainerEngine>,
        name: Option<String>,
        driver: &str,
        timeout: Duration,
        name_factory: &dyn NameFactory,
    ) -> Result<Self, EngineError> {
        let name = name.unwrap_or_else(|| name_factory.next_name());
        let volume = tokio::time::timeout(timeout, engine.create_volume(&name, driver))
            .await
            .map_err(|_| EngineError::new(format!("create_volume timed out after {timeout:?}")))??;
        Ok(Self {
            engine,
            volume: Some(volume),
        })
    }

    pub fn volume_ref(&self) -> Option<&VolumeId> {
        self.volume.as_ref()
    }

    /// Deletes the volume, best-effort: errors are swallowed, matching
    /// `runbox/docker/docker_api.py::workdir`'s `suppress(DockerError)`.
    pub async fn close(&mut self) {
        if let Some(volume) = self.volume.take() {
            let _ = self.engine.delete_volume(&volume).await;
        }
    }
}

#[cfg(test)]
#[path = "volume_scope_tests.rs"]
mod tests;
