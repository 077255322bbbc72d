//! Group orchestration: ordered setup, failure containment, teardown
//! (spec §4.8).

use std::collections::HashMap;
use std::sync::Arc;

use crate::build_state::BuildState;
use crate::engine_trait::ContainerEngine;
use crate::error::StageError;
use crate::group::{Group, GroupStatus};
use crate::observer::Observer;
use crate::shared::SharedState;
use crate::stage::Stage;
use tracing::{info, warn};

/// Ordered collection of stage groups sharing one engine, observer, and
/// `shared` map.
///
/// Groups preserve insertion order (a `Vec` plus a name index, mirroring
/// the teacher's `IndexMap`-free job-queue ordering in
/// `oj-core::worker::WorkerPool`) rather than a plain `HashMap`, since
/// `finalize` must dispose groups in declaration order.
pub struct Pipeline {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
    engine: Option<Arc<dyn ContainerEngine>>,
    observer: Option<Arc<dyn Observer>>,
    shared: SharedState,
    meta: serde_json::Map<String, serde_json::Value>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
            engine: None,
            observer: None,
            shared: SharedState::new(),
            meta: serde_json::Map::new(),
        }
    }

    pub fn with_executor(mut self, engine: Arc<dyn ContainerEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_initial_state(mut self, state: SharedState) -> Self {
        self.shared = state;
        self
    }

    pub fn update_meta(mut self, meta: serde_json::Map<String, serde_json::Value>) -> Self {
        self.meta.extend(meta);
        self
    }

    pub fn meta(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.meta
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Appends `stages` to `group`, creating it (preserving insertion order)
    /// if it doesn't already exist.
    pub fn add_stages(
        mut self,
        group: impl Into<String>,
        stages: impl IntoIterator<Item = Box<dyn Stage>>,
    ) -> Self {
        let group = group.into();
        match self.index.get(&group) {
            Some(&i) => self.groups[i].stages.extend(stages),
            None => {
                let mut g = Group::new(group.clone());
                g.stages.extend(stages);
                self.index.insert(group, self.groups.len());
                self.groups.push(g);
            }
        }
        self
    }

    /// `true` once an engine is set and every declared group has at least
    /// one stage.
    pub fn is_valid(&self) -> bool {
        self.engine.is_some() && self.groups.iter().all(|g| !g.stages.is_empty())
    }

    // `engine` is `None` only before `with_executor`; every call site below
    // asserts `is_valid()` first, so this is infallible in practice.
    #[allow(clippy::expect_used)]
    fn build_state(&self) -> BuildState {
        BuildState {
            engine: self.engine.clone().expect("is_valid checked before use"),
            observer: self.observer.clone(),
            shared: self.shared.clone(),
        }
    }

    /// Runs `setup` on every stage of `group` in declaration order.
    ///
    /// On any stage's setup failing, the group is marked `failed`, that
    /// stage's own `dispose` is attempted (secondary errors suppressed),
    /// and the original error is returned. Earlier-setup stages in the
    /// group are left setup — overall teardown is `finalize`'s job.
    ///
    /// # Panics
    ///
    /// Panics if `group` was never declared via `add_stages`, if the
    /// pipeline is invalid (no engine, or some group has no stages), or if
    /// the group's stages were already setup. These are caller
    /// preconditions (spec §4.8), not recoverable runtime errors.
    #[allow(clippy::panic)]
    pub async fn execute_group(&mut self, group: &str) -> Result<(), StageError> {
        let &i = match self.index.get(group) {
            Some(i) => i,
            None => panic!("no group named \"{group}\" in pipeline"),
        };
        assert!(self.is_valid(), "pipeline state inconsistent: engine unset or a group is empty");
        assert!(
            self.groups[i].stages.iter().all(|s| !s.is_setup()),
            "some stages in group \"{group}\" have already been setup"
        );
        assert_eq!(self.groups[i].status, GroupStatus::Pending);

        let mut state = self.build_state();
        let mut failure: Option<(usize, StageError)> = None;
        for (idx, stage) in self.groups[i].stages.iter_mut().enumerate() {
            if let Err(e) = stage.setup(&mut state).await {
                failure = Some((idx, e));
                break;
            }
        }
        self.shared = state.shared;

        match failure {
            None => {
                self.groups[i].status = GroupStatus::Done;
                info!(group, stages = self.groups[i].stages.len(), "group setup complete");
                Ok(())
            }
            Some((idx, e)) => {
                self.groups[i].status = GroupStatus::Failed;
                warn!(group, stage = idx, error = %e, "group setup failed, disposing raising stage");
                let mut dispose_state = self.build_state();
                let _ = self.groups[i].stages[idx].dispose(&mut dispose_state).await;
                self.shared = dispose_state.shared;
                Err(e)
            }
        }
    }

    /// Disposes every setup-but-not-yet-disposed stage, in group then
    /// stage declaration order. The first error encountered is returned
    /// after every stage has had a chance to dispose; later errors are
    /// suppressed.
    pub async fn finalize(&mut self) -> Result<(), StageError> {
        let mut first_error = None;
        // Indexed rather than `self.groups.iter_mut()` nested in
        // `group.stages.iter_mut()`: `self.build_state()` needs a fresh
        // `&self` each iteration, which can't coexist with an outer
        // iterator already holding `self.groups` mutably borrowed.
        for g in 0..self.groups.len() {
            for s in 0..self.groups[g].stages.len() {
                let needs_dispose = {
                    let stage = &self.groups[g].stages[s];
                    stage.is_setup() && !stage.is_disposed()
                };
                if needs_dispose {
                    let mut state = self.build_state();
                    let result = self.groups[g].stages[s].dispose(&mut state).await;
                    self.shared = state.shared;
                    if let Err(e) = result {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// A [`Pipeline`] specialized to the common build-then-run shape, with
/// fixed convenience operations over two configurable group names.
pub struct CompileAndRunPipeline {
    pipeline: Pipeline,
    build_group: String,
    run_group: String,
}

impl CompileAndRunPipeline {
    pub fn new(build_group: impl Into<String>, run_group: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline::new(),
            build_group: build_group.into(),
            run_group: run_group.into(),
        }
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    pub fn into_pipeline(self) -> Pipeline {
        self.pipeline
    }

    pub async fn build(&mut self) -> Result<(), StageError> {
        let group = self.build_group.clone();
        self.pipeline.execute_group(&group).await
    }

    pub async fn run(&mut self) -> Result<(), StageError> {
        let group = self.run_group.clone();
        self.pipeline.execute_group(&group).await
    }
}

impl Default for CompileAndRunPipeline {
    fn default() -> Self {
        Self::new("build", "run")
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
