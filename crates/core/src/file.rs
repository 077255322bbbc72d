//! Injectable file content.

use serde::{Deserialize, Serialize};

/// Whether a [`File`]'s content should be treated as UTF-8 text or opaque bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    Binary,
}

impl Default for FileKind {
    fn default() -> Self {
        FileKind::Text
    }
}

/// A logical file to be injected into a container's working directory.
///
/// Immutable after construction. Text content is encoded UTF-8 on
/// injection; binary content is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub content: FileContent,
    #[serde(default)]
    pub kind: FileKind,
}

/// Raw content of a [`File`], stored however it was constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl Serialize for FileContent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            FileContent::Text(s) => serializer.serialize_str(s),
            FileContent::Bytes(b) => serializer.serialize_bytes(b),
        }
    }
}

impl<'de> Deserialize<'de> for FileContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Pipeline documents only ever carry text content (JSON/YAML have
        // no native bytes type); binary `File`s are constructed in code.
        String::deserialize(deserializer).map(FileContent::Text)
    }
}

impl File {
    /// Construct a text file.
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Text(content.into()),
            kind: FileKind::Text,
        }
    }

    /// Construct a binary file.
    pub fn binary(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Bytes(content),
            kind: FileKind::Binary,
        }
    }

    /// Returns this file's content as bytes, encoding text as UTF-8.
    pub fn content_bytes(&self) -> Vec<u8> {
        match &self.content {
            FileContent::Text(s) => s.as_bytes().to_vec(),
            FileContent::Bytes(b) => b.clone(),
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
