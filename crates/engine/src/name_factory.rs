//! Random name generation for engine-assigned containers and volumes.
//!
//! Grounded on `runbox/docker/docker_api.py`'s `lambda: str(uuid.uuid4())`
//! default name factory.

use std::sync::Arc;

/// Produces a fresh name on each call. Injected so tests can substitute a
/// deterministic sequence.
pub trait NameFactory: Send + Sync {
    fn next_name(&self) -> String;
}

/// Default factory: a random 128-bit identifier in canonical dashed-hex
/// form (`uuid::Uuid::new_v4()`).
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNameFactory;

impl NameFactory for RandomNameFactory {
    fn next_name(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

pub fn default_name_factory() -> Arc<dyn NameFactory> {
    Arc::new(RandomNameFactory)
}

#[cfg(test)]
#[path = "name_factory_tests.rs"]
mod tests;
