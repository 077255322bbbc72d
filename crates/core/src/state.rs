//! Post-mortem sandbox state.

use std::time::{Duration, Instant};

/// Snapshot of a container's lifecycle state, as reported by the engine
/// and overlaid with this crate's own watchdog classification.
///
/// `memory_limit` reflects the engine's OOM-kill flag (`OOMKilled` in the
/// original's field aliases); `cpu_limit` reflects this crate's own
/// wall-clock watchdog kill, which the engine has no knowledge of. At most
/// one of the two is ever true for a state returned after `wait()`.
#[derive(Debug, Clone)]
pub struct SandboxState {
    pub status: String,
    pub exit_code: Option<i64>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub memory_limit: bool,
    pub cpu_limit: bool,
}

impl SandboxState {
    /// `finished_at - started_at` if both are known, else `None` (spec's
    /// "unknown" sentinel).
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(finish)) => Some(finish.saturating_duration_since(start)),
            _ => None,
        }
    }

    /// A normal exit: no limit was hit and an exit code is present.
    pub fn is_normal_exit(&self) -> bool {
        !self.memory_limit && !self.cpu_limit && self.exit_code.is_some()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
