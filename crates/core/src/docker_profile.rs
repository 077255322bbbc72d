//! Container specification and command-line resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file::File;

/// The splat marker's spelling in a pipeline document: `"..."`.
const SPLAT_TOKEN: &str = "...";

/// One element of a [`DockerProfile`]'s `cmd_template`.
///
/// In a pipeline document this is either a bare string (a literal, or the
/// splat token `"..."`) or an object `{"index": N}` (a placeholder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdElement {
    /// A literal argv element.
    Literal(String),
    /// A positional reference to `files[index].name`.
    Placeholder { index: usize },
    /// The splat marker: "insert here the names of all files not already
    /// referenced by a placeholder".
    Splat,
}

impl Serialize for CmdElement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            CmdElement::Literal(s) => serializer.serialize_str(s),
            CmdElement::Splat => serializer.serialize_str(SPLAT_TOKEN),
            CmdElement::Placeholder { index } => {
                use serde::ser::SerializeStruct;
                let mut s = serializer.serialize_struct("Placeholder", 1)?;
                s.serialize_field("index", index)?;
                s.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for CmdElement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Placeholder { index: usize },
            Literal(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Placeholder { index } => Ok(CmdElement::Placeholder { index }),
            Raw::Literal(s) if s == SPLAT_TOKEN => Ok(CmdElement::Splat),
            Raw::Literal(s) => Ok(CmdElement::Literal(s)),
        }
    }
}

/// Container specification, immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerProfile {
    pub image: String,
    pub workdir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub cmd_template: Vec<CmdElement>,
}

/// Errors resolving a `cmd_template` against a concrete file list, or
/// otherwise malformed pipeline configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("placeholder index {index} out of range for {file_count} file(s)")]
    PlaceholderOutOfRange { index: usize, file_count: usize },
    #[error("cmd_template contains more than one splat marker")]
    DuplicateSplat,
    #[error("{0}")]
    Invalid(String),
}

impl DockerProfile {
    /// A minimal alpine profile suitable for `WriteFiles`' throwaway
    /// sandbox, matching `runbox/build_stages/stages.py::WriteFiles`'s
    /// default `Params.profile`.
    pub fn minimal_alpine(workdir: impl Into<String>) -> Self {
        Self {
            image: "alpine:latest".to_string(),
            workdir: workdir.into(),
            user: None,
            cmd_template: vec![],
        }
    }

    /// Resolves `cmd_template` against a concrete file sequence, producing
    /// the container's argv (spec §4.3).
    pub fn resolve_argv(&self, files: &[File]) -> Result<Vec<String>, ConfigError> {
        let mut used = vec![true; files.len()];
        let mut resolved: Vec<Option<String>> = Vec::with_capacity(self.cmd_template.len());
        let mut splat_at: Option<usize> = None;

        for element in &self.cmd_template {
            match element {
                CmdElement::Literal(s) => resolved.push(Some(s.clone())),
                CmdElement::Placeholder { index } => {
                    let file = files.get(*index).ok_or(ConfigError::PlaceholderOutOfRange {
                        index: *index,
                        file_count: files.len(),
                    })?;
                    used[*index] = false;
                    resolved.push(Some(file.name.clone()));
                }
                CmdElement::Splat => {
                    if splat_at.is_some() {
                        return Err(ConfigError::DuplicateSplat);
                    }
                    splat_at = Some(resolved.len());
                    resolved.push(None);
                }
            }
        }

        let mut argv = Vec::with_capacity(resolved.len());
        for (i, slot) in resolved.into_iter().enumerate() {
            match slot {
                Some(s) => argv.push(s),
                None => {
                    debug_assert_eq!(Some(i), splat_at);
                    for (j, file) in files.iter().enumerate() {
                        if used[j] {
                            argv.push(file.name.clone());
                        }
                    }
                }
            }
        }

        Ok(argv)
    }
}

#[cfg(test)]
#[path = "docker_profile_tests.rs"]
mod tests;
