//! Unified crate-level error type.
//!
//! A single [`Error`] covers both the transport layer and the stream state
//! machine, with a [`Result`] alias used throughout the crate.
//!
//! Two failure classes never surface here: a failed range probe falls back to
//! a full open, and a blocking-read stall is absorbed by the reconnect cycle.
//! Both are reported through the status sink only.
//!
//! Note: variants that wrap HTTP failures stay string/number-based so the
//! concrete HTTP client's error types don't leak into the public API.

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the `stream-source` crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource locator could not be parsed as a URL.
    #[error("invalid resource locator: {0}")]
    Locator(#[from] url::ParseError),

    /// The remote endpoint answered an open request with a non-success status.
    #[error("HTTP error: {status} for {url}")]
    OpenFailed {
        /// HTTP status code.
        status: u16,
        /// URL that failed.
        url: String,
    },

    /// The transport failed before a response status was available.
    #[error("transport error: {0}")]
    Transport(String),

    /// An operation that needs an opened stream was called before `open`.
    #[error("stream has not been opened")]
    NotOpen,

    /// The reconnect budget was used up without restoring connectivity.
    #[error("unable to reconnect after {attempts} attempts")]
    ReconnectExhausted {
        /// Number of reconnect attempts made.
        attempts: u32,
    },

    /// A discard-read during a forward seek hit the end of the stream.
    #[error("seek aborted: stream ended at byte {position}")]
    SeekFailed {
        /// Logical position reached before the seek gave up.
        position: u64,
    },

    /// Seek target was not a forward absolute position.
    #[error("only forward seeks from the stream start are supported")]
    UnsupportedSeek,
}

impl Error {
    /// Convenience helper wrapping a transport-level failure message.
    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        Error::Transport(err.to_string())
    }
}
