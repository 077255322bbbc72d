//! A [`File`] that may resolve its content from a filesystem path (spec §4.9).

use std::fs;
use std::path::PathBuf;

use serde::{de, Deserialize, Deserializer};

use crucible_core::{File, FileContent, FileKind};

/// Extends [`File`] with an optional `path`: exactly one of `path`/`content`
/// must be set, and `path` content is read eagerly at deserialize time.
///
/// Grounded on `runbox/build_stages/stages.py::LoadableFile`'s
/// `root_validator(pre=True)`, which likewise reads the file during model
/// validation rather than deferring it to stage setup.
#[derive(Debug, Clone)]
pub struct LoadableFile(File);

impl From<LoadableFile> for File {
    fn from(loadable: LoadableFile) -> Self {
        loadable.0
    }
}

#[derive(Deserialize)]
struct Raw {
    name: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default, rename = "type")]
    kind: FileKind,
}

impl<'de> Deserialize<'de> for LoadableFile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Raw::deserialize(deserializer)?;
        let kind = raw.kind;

        let content = match (raw.path, raw.content) {
            (Some(_), Some(_)) => {
                return Err(de::Error::custom("'path' and 'content' are mutually exclusive"))
            }
            (None, None) => {
                return Err(de::Error::custom("one of 'path' or 'content' must be set"))
            }
            (Some(path), None) => match kind {
                FileKind::Text => {
                    let text = fs::read_to_string(&path)
                        .map_err(|e| de::Error::custom(format!("failed to read '{}': {e}", path.display())))?;
                    FileContent::Text(text)
                }
                FileKind::Binary => {
                    let bytes = fs::read(&path)
                        .map_err(|e| de::Error::custom(format!("failed to read '{}': {e}", path.display())))?;
                    FileContent::Bytes(bytes)
                }
            },
            (None, Some(text)) => FileContent::Text(text),
        };

        Ok(LoadableFile(File {
            name: raw.name,
            content,
            kind,
        }))
    }
}

#[cfg(test)]
#[path = "loadable_file_tests.rs"]
mod tests;
