//! Concrete engine adapters: the production `bollard`-backed
//! [`ContainerEngine`](crucible_core::ContainerEngine) and the tar file
//! packager (spec §4.1, §4.2).

mod bollard_engine;
mod error;
pub mod packager;

pub use bollard_engine::BollardEngine;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeEngine, FakeObserver, ScriptedOutcome};
