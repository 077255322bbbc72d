//! Volume mount specification.

use serde::{Deserialize, Serialize};

use crate::id::VolumeId;

/// A volume bound into a container at creation time. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub volume: VolumeId,
    pub bind: String,
    #[serde(default)]
    pub readonly: bool,
}

impl Mount {
    pub fn new(volume: VolumeId, bind: impl Into<String>, readonly: bool) -> Self {
        Self {
            volume,
            bind: bind.into(),
            readonly,
        }
    }
}

#[cfg(test)]
#[path = "mount_tests.rs"]
mod tests;
