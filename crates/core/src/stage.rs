//! The two-phase resource contract every pipeline stage implements (spec §4.7).

use async_trait::async_trait;

use crate::build_state::BuildState;
use crate::error::StageError;

/// A single step of a pipeline group.
///
/// Stages are explicitly two-phase (`setup`/`dispose`), not RAII scope
/// guards: a pipeline group's stages are collected up front and their
/// lifetimes are driven by [`crate::pipeline::Pipeline::execute_group`] and
/// [`crate::pipeline::Pipeline::finalize`], not by Rust's own drop order.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The stage's key, used to label errors and (for stages that publish
    /// into `shared`) as the map key.
    fn key(&self) -> &str;

    /// Whether `setup` has been called and returned successfully.
    fn is_setup(&self) -> bool;

    /// Whether `dispose` has been called and returned (successfully or not).
    fn is_disposed(&self) -> bool;

    /// Acquires whatever resources this stage owns, publishing results into
    /// `state.shared` as appropriate. Called at most once per stage.
    async fn setup(&mut self, state: &mut BuildState) -> Result<(), StageError>;

    /// Releases whatever resources this stage acquired during `setup`.
    /// Called at most once per stage, even if `setup` never succeeded.
    async fn dispose(&mut self, state: &mut BuildState) -> Result<(), StageError>;
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
