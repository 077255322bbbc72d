//! Keyed state shared among stages within one pipeline execution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::file::File;
use crate::id::VolumeId;
use crate::sandbox_handle::SandboxHandle;

/// A value published into [`SharedState`] by a stage's `setup`.
///
/// Design Notes §9 pins this shape explicitly: `shared` holds *borrowed*
/// references whose authoritative owner is the publishing stage, modeled
/// as a tagged variant rather than letting a sandbox or volume "own
/// itself".
#[derive(Clone)]
pub enum SharedValue {
    Volume(VolumeId),
    Sandbox(Arc<SandboxHandle>),
    Files(Vec<File>),
}

impl SharedValue {
    pub fn as_volume(&self) -> Option<&VolumeId> {
        match self {
            SharedValue::Volume(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sandbox(&self) -> Option<&Arc<SandboxHandle>> {
        match self {
            SharedValue::Sandbox(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the files carried by this value, accepting either a single
    /// file or a list of files, matching
    /// `runbox/build_stages/stages.py::WriteFiles.get_files`'s leniency.
    pub fn as_files(&self) -> Option<&[File]> {
        match self {
            SharedValue::Files(files) => Some(files),
            _ => None,
        }
    }
}

/// Mapping from string keys to opaque artifacts. Keys are chosen by stage
/// parameters; the pipeline itself never interprets them.
pub type SharedState = HashMap<String, SharedValue>;

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
