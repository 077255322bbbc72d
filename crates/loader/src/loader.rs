//! Turns a parsed pipeline document into an instantiated, unwired
//! [`Pipeline`] (spec §4.9).

use thiserror::Error;

use crucible_core::Pipeline;

use crate::document::{DocumentError, Format, PipelineDocument};
use crate::registry::{RegistryError, StageRegistry};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("group '{group}', stage {index}: a stage entry must have exactly one key (the stage kind), found {key_count}")]
    MalformedStageEntry {
        group: String,
        index: usize,
        key_count: usize,
    },
    #[error("group '{group}', stage {index}: {source}")]
    Stage {
        group: String,
        index: usize,
        #[source]
        source: RegistryError,
    },
}

/// Parses a pipeline document and, via an injected [`StageRegistry`],
/// instantiates every stage it names — preserving group and stage order —
/// without wiring an engine, observer, or initial shared state. Those are
/// runtime resources the document format has no opinion on; callers chain
/// `with_executor`/`with_observer` onto [`PipelineLoader::load`]'s result.
///
/// Grounded on `runbox/build_stages/pipeline_loaders.py::JsonPipelineLoader`,
/// which likewise parses eagerly at construction and exposes `meta` as a
/// property rather than re-parsing on every `load()` call.
pub struct PipelineLoader {
    document: PipelineDocument,
}

impl PipelineLoader {
    pub fn new(content: &str, format: Format) -> Result<Self, LoaderError> {
        let document = PipelineDocument::parse(content, format)?;
        Ok(Self { document })
    }

    pub fn meta(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.document.meta
    }

    /// Builds a fresh [`Pipeline`] with every stage constructed via
    /// `registry`, added group-by-group in document order, and `meta`
    /// copied onto the pipeline.
    pub fn load(&self, registry: &StageRegistry) -> Result<Pipeline, LoaderError> {
        let mut pipeline = Pipeline::new().update_meta(self.document.meta.clone());

        for (group, entries) in &self.document.pipeline {
            let mut stages = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                if entry.len() != 1 {
                    return Err(LoaderError::MalformedStageEntry {
                        group: group.clone(),
                        index,
                        key_count: entry.len(),
                    });
                }
                let (kind, params) = entry
                    .iter()
                    .next()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .unwrap_or_default();
                let stage = registry
                    .build(&kind, params)
                    .map_err(|source| LoaderError::Stage {
                        group: group.clone(),
                        index,
                        source,
                    })?;
                stages.push(stage);
            }
            pipeline = pipeline.add_stages(group.clone(), stages);
        }

        Ok(pipeline)
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
