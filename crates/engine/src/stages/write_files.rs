//! Deposits files into a shared volume via a throwaway sandbox (spec §4.7).

use async_trait::async_trait;
use serde::Deserialize;

use crucible_core::build_state::BuildState;
use crucible_core::{DockerProfile, File, StageError};

use crate::builder::SandboxBuilder;

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFilesParams {
    pub key: String,
    pub file_keys: Vec<String>,
    pub volume: String,
    #[serde(default = "default_profile")]
    pub profile: DockerProfile,
}

fn default_profile() -> DockerProfile {
    DockerProfile::minimal_alpine("/tmp")
}

/// Gathers [`File`]s from `shared[file_keys[i]]`, accepting either a single
/// file or a list of files; builds an ephemeral sandbox mounting the
/// target volume at the profile's working directory, creates it (which
/// deposits the files), and deletes it without ever running it.
///
/// Grounded on `runbox/build_stages/stages.py::WriteFiles`.
pub struct WriteFiles {
    params: WriteFilesParams,
    is_setup: bool,
    is_disposed: bool,
}

impl WriteFiles {
    pub fn new(params: WriteFilesParams) -> Self {
        Self {
            params,
            is_setup: false,
            is_disposed: false,
        }
    }

    fn gather_files(&self, state: &BuildState) -> Result<Vec<File>, StageError> {
        let mut collected = Vec::new();
        for key in &self.params.file_keys {
            let value = state.shared.get(key).ok_or_else(|| StageError::Other {
                key: self.params.key.clone(),
                message: format!("key '{key}' is not in shared state"),
            })?;
            match value.as_files() {
                Some(files) => collected.extend(files.iter().cloned()),
                None => {
                    return Err(StageError::Other {
                        key: self.params.key.clone(),
                        message: format!("value at key '{key}' is not a file or list of files"),
                    })
                }
            }
        }
        Ok(collected)
    }
}

#[async_trait]
impl crucible_core::Stage for WriteFiles {
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
        let files = self.gather_files(state)?;

        let volume = state
            .shared
            .get(&self.params.volume)
            .and_then(|v| v.as_volume())
            .cloned()
            .ok_or_else(|| StageError::Other {
                key: self.params.key.clone(),
                message: format!("key '{}' is not a volume in shared state", self.params.volume),
            })?;

        let builder = SandboxBuilder::new()
            .with_profile(self.params.profile.clone())
            .mount(volume, self.params.profile.workdir.clone(), false)
            .add_files(files);

        // Creating is enough to deposit the files (`SandboxBuilder::create`
        // always writes them); the sandbox is never run.
        let sandbox = builder.create(state.engine.clone(), std::time::Duration::from_secs(5)).await?;
        sandbox.delete(false).await?;
        Ok(())
    }

    async fn dispose(&mut self, _state: &mut BuildState) -> Result<(), StageError> {
        self.is_disposed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "write_files_tests.rs"]
mod tests;
