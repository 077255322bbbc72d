//! The external collaborator that receives sandbox output and supplies stdin.

use async_trait::async_trait;

/// Which stream a message from an attached sandbox came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamId {
    Stdout = 1,
    Stderr = 2,
}

/// Receives per-message stdout/stderr text from an attached `UseSandbox`
/// stage and supplies stdin chunks to write back.
///
/// `stdin` is polled lazily; it may be empty or end at any point. Each
/// non-`None` chunk it yields is UTF-8-encoded and written to the
/// sandbox's stdin.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Returns the next stdin chunk to write, or `None` once exhausted.
    async fn next_stdin(&self) -> Option<String>;

    /// Called once per message delivered on the attached stream, in the
    /// engine's own delivery order for a given `stream`.
    async fn write_output(&self, key: &str, data: &str, stream: StreamId);
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
