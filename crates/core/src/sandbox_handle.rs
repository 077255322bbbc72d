//! Marker for sandbox handles published into [`crate::shared::SharedState`].
//!
//! `crucible-core` never runs a sandbox itself (that lives in
//! `crucible-engine`, which depends on `crucible-core`, not the other way
//! around). `SandboxRef` is the marker the concrete `Sandbox` type
//! implements so it can be stored as [`crate::shared::SharedValue::Sandbox`]
//! without creating a dependency cycle.

use std::fmt::Debug;

pub trait SandboxRef: Send + Sync + Debug {}

/// Dynamically-dispatched handle to a sandbox owned by its publishing stage.
pub type SandboxHandle = dyn SandboxRef;
