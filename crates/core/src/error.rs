//! Error kinds visible to callers (spec §6/§7).

use serde::Serialize;
use thiserror::Error;

use crate::docker_profile::{ConfigError, DockerProfile};
use crate::file::File;
use crate::limits::Limits;

/// An error from the container engine itself (daemon unreachable, image
/// missing, name conflict, invalid mount, ...). The adapter is the only
/// place that knows engine-specific error shapes; everything upstream
/// just sees this.
#[derive(Debug, Error)]
#[error("engine error: {0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Raised when an engine call bounded by an overall timeout (e.g.
/// `create_container`) does not complete in time. Distinct from a
/// sandbox's wall-clock watchdog expiry, which is a classification
/// outcome, not an error (spec §4.4/§7.5).
#[derive(Debug, Error)]
#[error("timed out after {0:?}")]
pub struct TimeoutError(pub std::time::Duration);

/// Errors from `Sandbox` operations invoked in the wrong state machine
/// state, or other sandbox-local invariant violations.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("already running")]
    AlreadyRunning,
    #[error("not running")]
    NotRunning,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A serializable snapshot of a classifying stage's inputs, attached to
/// classification errors for caller-side reporting. Grounded on the
/// Python original's `MemoryLimitError[UseSandbox.Params](self.params.limits,
/// self.params.key, self.params, self)`
/// (`runbox/build_stages/stages.py`), which hands the raising stage's
/// params object (not just a bare limit value) to the exception.
#[derive(Debug, Clone, Serialize)]
pub struct StageParams {
    pub key: String,
    pub profile: DockerProfile,
    pub limits: Limits,
    pub files: Vec<File>,
    pub mount_keys: Vec<String>,
    pub attach: bool,
}

/// A classification outcome from `UseSandbox` (spec §4.7 step 6), carrying
/// the stage's key, a `stage_kind` identifier, and its full `params` for
/// caller-side reporting (spec §7: "each raised `StageError` carries the
/// stage's key, its params, and a reference to the stage").
#[derive(Debug, Error)]
pub enum StageError {
    #[error("error in stage {key}: sandbox finished with non-zero exit code ({exit_code})")]
    NonZeroExitCode {
        key: String,
        exit_code: i64,
        stage_kind: &'static str,
        params: StageParams,
    },
    #[error("error in stage {key}: sandbox has been killed due to time limit >{limit_secs}s")]
    CpuLimit {
        key: String,
        limit_secs: u64,
        stage_kind: &'static str,
        params: StageParams,
    },
    #[error("error in stage {key}: sandbox has been killed due to memory limit >{limit_mb}MB")]
    MemoryLimit {
        key: String,
        limit_mb: u64,
        stage_kind: &'static str,
        params: StageParams,
    },
    #[error("error in stage {key}: can't attach without observer")]
    NoObserver { key: String },
    #[error("error in stage {key}: {message}")]
    Other { key: String, message: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

impl StageError {
    pub fn cpu_limit(params: StageParams) -> Self {
        StageError::CpuLimit {
            key: params.key.clone(),
            limit_secs: params.limits.time.as_secs(),
            stage_kind: "use_sandbox",
            params,
        }
    }

    pub fn memory_limit(params: StageParams) -> Self {
        StageError::MemoryLimit {
            key: params.key.clone(),
            limit_mb: params.limits.memory_mb,
            stage_kind: "use_sandbox",
            params,
        }
    }

    pub fn non_zero_exit(params: StageParams, exit_code: i64) -> Self {
        StageError::NonZeroExitCode {
            key: params.key.clone(),
            exit_code,
            stage_kind: "use_sandbox",
            params,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
