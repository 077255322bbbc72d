//! Scoped volume acquisition as a pipeline stage (spec §4.7).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crucible_core::build_state::BuildState;
use crucible_core::shared::SharedValue;
use crucible_core::stage::Stage;
use crucible_core::StageError;

use crate::name_factory::default_name_factory;
use crate::volume_scope::VolumeScope;

#[derive(Debug, Clone, Deserialize)]
pub struct UseVolumeParams {
    pub key: String,
}

/// Opens a [`VolumeScope`] in `setup`, publishing the volume to
/// `shared[key]`; closes it and removes the key in `dispose`.
///
/// Grounded on `runbox/build_stages/stages.py::UseVolume`.
pub struct UseVolume {
    params: UseVolumeParams,
    scope: Option<VolumeScope>,
    is_setup: bool,
    is_disposed: bool,
}

impl UseVolume {
    pub fn new(params: UseVolumeParams) -> Self {
        Self {
            params,
            scope: None,
            is_setup: false,
            is_disposed: false,
        }
    }
}

#[async_trait]
impl Stage for UseVolume {
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
        let name_factory = default_name_factory();
        let scope = VolumeScope::open(
            state.engine.clone(),
            None,
            "local",
            Duration::from_secs(5),
            name_factory.as_ref(),
        )
        .await?;

        let volume_ref = scope
            .volume_ref()
            .cloned()
            .ok_or_else(|| StageError::Other {
                key: self.params.key.clone(),
                message: "volume scope opened with no volume reference".to_string(),
            })?;
        state.shared.insert(self.params.key.clone(), SharedValue::Volume(volume_ref));
        self.scope = Some(scope);
        Ok(())
    }

    async fn dispose(&mut self, state: &mut BuildState) -> Result<(), StageError> {
        self.is_disposed = true;
        if let Some(mut scope) = self.scope.take() {
            scope.close().await;
        }
        state.shared.remove(&self.params.key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "use_volume_tests.rs"]
mod tests;
