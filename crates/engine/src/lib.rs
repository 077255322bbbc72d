//! Sandbox lifecycle, builder, and the declarative pipeline stage kinds.

pub mod builder;
pub mod name_factory;
pub mod queued_pipeline;
pub mod sandbox;
pub mod shortcuts;
pub mod stages;
pub mod volume_scope;
pub mod watchdog;

pub use builder::{BuildError, SandboxBuilder};
pub use name_factory::{default_name_factory, NameFactory, RandomNameFactory};
pub use queued_pipeline::{PipelineHooks, PipelineRequest, QueuedPipeline};
pub use sandbox::Sandbox;
pub use shortcuts::{execute, OutputLine};
pub use stages::{SandboxMountParams, UseSandbox, UseSandboxParams, UseVolume, UseVolumeParams, WriteFiles, WriteFilesParams};
pub use volume_scope::VolumeScope;
pub use watchdog::Watchdog;
