//! Shared context threaded through every stage's `setup`/`dispose` (spec §4.8).

use std::sync::Arc;

use crate::engine_trait::ContainerEngine;
use crate::observer::Observer;
use crate::shared::SharedState;

/// Everything a [`crate::stage::Stage`] needs to do its work: the engine
/// client, an optional observer, and the cross-stage `shared` map.
///
/// `shared` is a plain (non-`Mutex`) map because stage execution is
/// cooperative and serialized by [`crate::pipeline::Pipeline::execute_group`]
/// — no two stages' `setup`/`dispose` run concurrently (spec §5).
pub struct BuildState {
    pub engine: Arc<dyn ContainerEngine>,
    pub observer: Option<Arc<dyn Observer>>,
    pub shared: SharedState,
}

impl BuildState {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            engine,
            observer: None,
            shared: SharedState::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }
}

#[cfg(test)]
#[path = "build_state_tests.rs"]
pub(crate) mod tests;
