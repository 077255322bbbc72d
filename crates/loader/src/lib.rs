//! Declarative pipeline documents: parsing, stage registry, loading.

pub mod document;
pub mod loadable_file;
pub mod loader;
pub mod registry;

pub use document::{DocumentError, Format, PipelineDocument, StageEntry};
pub use loadable_file::LoadableFile;
pub use loader::{LoaderError, PipelineLoader};
pub use registry::{default_registry, RegistryError, StageFactory, StageRegistry};
