//! Mapping from `bollard`'s error type to this crate's opaque [`EngineError`].

use crucible_core::{EngineError, TimeoutError};

pub(crate) fn engine_error(err: bollard::errors::Error) -> EngineError {
    EngineError::new(err.to_string())
}

pub(crate) fn timeout_error(timeout: std::time::Duration) -> TimeoutError {
    TimeoutError(timeout)
}
