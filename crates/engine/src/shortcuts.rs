//! One-shot sandbox execution without pipeline machinery.
//!
//! `[SUPPLEMENT]` grounded on `runbox/shortucts.py::execute`: a free
//! function for callers that want to run a single profile/files/limits
//! combination and read back decoded output, without building a
//! [`crucible_core::Pipeline`] or a stage.

use std::sync::Arc;
use std::time::Duration;

use crucible_core::engine_trait::ContainerEngine;
use crucible_core::{DockerProfile, File, Limits, StageError, StageParams};

use crate::builder::SandboxBuilder;

/// One decoded output line from a sandbox run, tagged with which stream it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: crucible_core::StreamId,
    pub text: String,
}

/// Builds a sandbox from `profile`/`files`/`limits`, runs it to completion
/// against `engine`, and returns its decoded stdout/stderr lines in
/// delivery order alongside its classification.
///
/// Unlike [`crate::stages::UseSandbox`], a classification failure does not
/// short-circuit: the sandbox is always deleted before `execute` returns,
/// and the caller receives both the collected output and the
/// classification error (if any), since there is no stage/group dispose
/// pass to guarantee cleanup here.
pub async fn execute(
    engine: Arc<dyn ContainerEngine>,
    profile: DockerProfile,
    files: Vec<File>,
    limits: Limits,
    stdin: Option<&[u8]>,
) -> (Vec<OutputLine>, Result<(), StageError>) {
    let key = "shortcut".to_string();
    let params = StageParams {
        key: key.clone(),
        profile: profile.clone(),
        limits,
        files: files.clone(),
        mount_keys: vec![],
        attach: false,
    };
    let builder = SandboxBuilder::new()
        .with_profile(profile)
        .with_limits(limits)
        .add_files(files);

    let sandbox = match builder.create(engine, Duration::from_secs(5)).await {
        Ok(sandbox) => sandbox,
        Err(e) => return (Vec::new(), Err(StageError::from(e))),
    };

    let mut stream = match sandbox.run(stdin).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = sandbox.delete(true).await;
            return (Vec::new(), Err(StageError::Sandbox(e)));
        }
    };

    let mut lines = Vec::new();
    while let Ok(Some(message)) = stream.read_message().await {
        lines.push(OutputLine {
            stream: message.stream,
            text: String::from_utf8_lossy(&message.payload).into_owned(),
        });
    }
    drop(stream);

    let outcome: Result<(), StageError> = async {
        sandbox.wait().await?;
        let result = sandbox.state().await?;
        if result.memory_limit {
            return Err(StageError::memory_limit(params.clone()));
        }
        if result.cpu_limit {
            return Err(StageError::cpu_limit(params.clone()));
        }
        if let Some(exit_code) = result.exit_code {
            if exit_code != 0 {
                return Err(StageError::non_zero_exit(params.clone(), exit_code));
            }
        }
        Ok(())
    }
    .await;

    let _ = sandbox.delete(false).await;
    (lines, outcome)
}

#[cfg(test)]
#[path = "shortcuts_tests.rs"]
mod tests;
