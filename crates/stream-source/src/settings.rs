//! Settings for [`StreamSource`](crate::StreamSource).
//!
//! Plain data with builder-style `with_*` methods. All knobs bound a
//! suspension somewhere in the read path: reconnect stalls are limited to
//! `reconnect_delay * reconnect_budget` per disconnect episode, and a
//! blocking read waits at most `read_timeout` before declaring a stall.

use std::time::Duration;

/// Settings controlling reconnection and blocking-read behavior.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum reconnect attempts per disconnect episode.
    /// Default: 3.
    pub reconnect_budget: u32,

    /// Fixed pause before each reconnect attempt.
    /// Default: 500 ms.
    pub reconnect_delay: Duration,

    /// Wall-clock budget a blocking read waits for data before treating the
    /// stream as stalled.
    /// Default: 500 ms.
    pub read_timeout: Duration,

    /// Scratch-buffer size used by the discard-reads that emulate a forward
    /// seek.
    /// Default: 128 bytes.
    pub seek_chunk: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reconnect_budget: 3,
            reconnect_delay: Duration::from_millis(500),
            read_timeout: Duration::from_millis(500),
            seek_chunk: 128,
        }
    }
}

impl Settings {
    /// Create default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum reconnect attempts per disconnect episode.
    pub fn with_reconnect_budget(mut self, budget: u32) -> Self {
        self.reconnect_budget = budget;
        self
    }

    /// Set the pause before each reconnect attempt.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the blocking-read wait budget.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the discard-read scratch size used by forward seeks.
    pub fn with_seek_chunk(mut self, chunk: usize) -> Self {
        self.seek_chunk = chunk.max(1);
        self
    }
}
