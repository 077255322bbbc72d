//! Core data model and pipeline execution engine.
//!
//! This crate is engine-agnostic: it defines the [`engine_trait::ContainerEngine`]
//! capability surface, the stage/group/pipeline orchestration (spec §4.7-§4.8),
//! and the shared data model (files, profiles, limits, mounts, state). Concrete
//! engine adapters live in `crucible-adapters`; the concrete `Sandbox` and core
//! stage implementations live in `crucible-engine`.

pub mod build_state;
pub mod docker_profile;
pub mod engine_trait;
pub mod error;
pub mod file;
pub mod group;
pub mod id;
pub mod limits;
pub mod mount;
pub mod observer;
pub mod pipeline;
pub mod sandbox_handle;
pub mod shared;
pub mod stage;
pub mod state;

pub use build_state::BuildState;
pub use docker_profile::{CmdElement, ConfigError, DockerProfile};
pub use engine_trait::{AttachedStream, ContainerConfig, ContainerEngine, EngineMessage, RawContainerState};
pub use error::{EngineError, SandboxError, StageError, StageParams, TimeoutError};
pub use file::{File, FileContent, FileKind};
pub use group::{Group, GroupStatus};
pub use id::{ContainerId, VolumeId};
pub use limits::Limits;
pub use mount::Mount;
pub use observer::{Observer, StreamId};
pub use pipeline::{CompileAndRunPipeline, Pipeline};
pub use sandbox_handle::{SandboxHandle, SandboxRef};
pub use shared::{SharedState, SharedValue};
pub use stage::Stage;
pub use state::SandboxState;
