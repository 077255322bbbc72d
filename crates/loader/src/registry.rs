//! Resolves pipeline-document stage kinds to concrete stages (spec §4.9's
//! injected `stage_getter`).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crucible_core::{DockerProfile, File, Limits, Stage};
use crucible_engine::{SandboxMountParams, UseSandbox, UseSandboxParams, UseVolume, UseVolumeParams, WriteFiles, WriteFilesParams};

use crate::loadable_file::LoadableFile;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no stage registered for kind '{0}'")]
    UnknownKind(String),
    #[error("invalid params for stage kind '{kind}': {source}")]
    InvalidParams {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Constructs a boxed [`Stage`] from a stage kind's raw params value.
pub trait StageFactory: Send + Sync {
    fn build(&self, params: serde_json::Value) -> Result<Box<dyn Stage>, serde_json::Error>;
}

impl<F> StageFactory for F
where
    F: Fn(serde_json::Value) -> Result<Box<dyn Stage>, serde_json::Error> + Send + Sync,
{
    fn build(&self, params: serde_json::Value) -> Result<Box<dyn Stage>, serde_json::Error> {
        self(params)
    }
}

/// Maps canonical stage-kind names to factories.
///
/// Not a process-global registry: callers construct one (typically
/// [`default_registry`]) and inject it into [`crate::loader::PipelineLoader`],
/// mirroring `runbox/build_stages/pipeline_loaders.py::StageGetter`'s
/// callable-injection shape without the accompanying module-path lookup —
/// Rust has no dynamic `importlib` equivalent, so kinds are registered by
/// value instead of resolved by dotted path.
pub struct StageRegistry {
    factories: HashMap<String, Arc<dyn StageFactory>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: impl StageFactory + 'static) -> &mut Self {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    pub fn build(&self, kind: &str, params: serde_json::Value) -> Result<Box<dyn Stage>, RegistryError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownKind(kind.to_string()))?;
        factory
            .build(params)
            .map_err(|source| RegistryError::InvalidParams {
                kind: kind.to_string(),
                source,
            })
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        default_registry()
    }
}

/// Mirrors [`UseSandboxParams`] but with `files: Vec<LoadableFile>`, since
/// the core `File` type's own `Deserialize` impl only accepts inline
/// content — `LoadableFile` is a loader-layer concern, not a core one.
#[derive(Deserialize)]
struct RawUseSandboxParams {
    key: String,
    profile: DockerProfile,
    #[serde(default)]
    limits: Limits,
    #[serde(default)]
    files: Vec<LoadableFile>,
    #[serde(default)]
    mounts: Vec<SandboxMountParams>,
    #[serde(default)]
    attach: Option<bool>,
}

/// The core stage kinds spec.md §4.9 names: `use_volume`, `write_files`,
/// `use_sandbox`.
pub fn default_registry() -> StageRegistry {
    let mut registry = StageRegistry::new();

    registry.register("use_volume", |params: serde_json::Value| {
        let params: UseVolumeParams = serde_json::from_value(params)?;
        Ok(Box::new(UseVolume::new(params)) as Box<dyn Stage>)
    });

    registry.register("write_files", |params: serde_json::Value| {
        let params: WriteFilesParams = serde_json::from_value(params)?;
        Ok(Box::new(WriteFiles::new(params)) as Box<dyn Stage>)
    });

    registry.register("use_sandbox", |params: serde_json::Value| {
        let raw: RawUseSandboxParams = serde_json::from_value(params)?;
        let params = UseSandboxParams {
            key: raw.key,
            profile: raw.profile,
            limits: raw.limits,
            files: raw.files.into_iter().map(File::from).collect(),
            mounts: raw.mounts,
            attach: raw.attach.unwrap_or(true),
        };
        Ok(Box::new(UseSandbox::new(params)) as Box<dyn Stage>)
    });

    registry
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
