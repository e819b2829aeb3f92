//! Transport seam between the stream source and the HTTP layer.
//!
//! [`Transport`] issues requests (full GET, ranged GET, metadata probe) and
//! hands back a [`Connection`] that owns one response body. The source only
//! ever talks to these two traits, so the state machine can be driven by the
//! `reqwest`-backed [`HttpTransport`](crate::HttpTransport) in production and
//! by a scripted implementation in tests.
//!
//! A `Connection` buffers body bytes internally: `fill` suspends until more
//! arrive, `try_fill` polls without suspending, and `read_buffered` hands out
//! what has already been buffered. `is_connected` distinguishes a transport
//! that died from one that merely has nothing buffered right now; a cleanly
//! finished body still counts as connected.

pub mod http;

use crate::error::Result;
use url::Url;

/// Declared total length of a remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentLength {
    /// The transport reported a total byte length.
    Known(u64),
    /// No usable length information (chunked/live streams).
    #[default]
    Unknown,
}

impl ContentLength {
    /// The length when known.
    pub fn known(self) -> Option<u64> {
        match self {
            ContentLength::Known(len) => Some(len),
            ContentLength::Unknown => None,
        }
    }
}

impl From<Option<u64>> for ContentLength {
    fn from(value: Option<u64>) -> Self {
        match value {
            Some(len) => ContentLength::Known(len),
            None => ContentLength::Unknown,
        }
    }
}

impl From<ContentLength> for Option<u64> {
    fn from(value: ContentLength) -> Self {
        value.known()
    }
}

/// Whether the remote resource accepts byte-range requests.
///
/// Learned from the `Accept-Ranges` probe; `Unknown` until a probe has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeSupport {
    /// No probe has been made for the current resource.
    #[default]
    Unknown,
    /// The resource advertised `Accept-Ranges: bytes`.
    Supported,
    /// The resource answered the probe without advertising byte ranges.
    Unsupported,
}

/// Result of a HEAD-equivalent metadata probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeInfo {
    /// Whether `Accept-Ranges: bytes` was advertised.
    pub accepts_ranges: bool,
    /// Total resource length reported by the probe.
    pub content_length: ContentLength,
}

/// Issues requests against a remote resource.
pub trait Transport {
    /// Connection type produced by this transport.
    type Conn: Connection;

    /// Issue a full GET. Fails on a non-success status.
    fn get(&self, url: &Url) -> impl std::future::Future<Output = Result<Self::Conn>> + Send;

    /// Issue a GET with `Range: bytes=<start>-<end>` (`end` inclusive, open
    /// ended when `None`). Both 200 and 206 responses count as success.
    fn get_range(
        &self,
        url: &Url,
        start: u64,
        end: Option<u64>,
    ) -> impl std::future::Future<Output = Result<Self::Conn>> + Send;

    /// HEAD-equivalent metadata probe capturing range capability and total
    /// length. Fails on a non-success status.
    fn probe(&self, url: &Url) -> impl std::future::Future<Output = Result<ProbeInfo>> + Send;
}

/// One live response body with internal buffering.
pub trait Connection: Send {
    /// Total length reported alongside this response, if any.
    fn content_length(&self) -> ContentLength;

    /// Whether the transport is still usable. A cleanly finished body stays
    /// connected (keep-alive); only a transport failure or an explicit
    /// `flush`/`abort` disconnects.
    fn is_connected(&self) -> bool;

    /// Bytes already buffered and ready for `read_buffered`.
    fn available(&self) -> usize;

    /// Suspend until at least one more chunk is buffered. Returns the number
    /// of newly buffered bytes; `0` means the body ended or the transport
    /// failed (check `is_connected`).
    fn fill(&mut self) -> impl std::future::Future<Output = usize> + Send;

    /// Buffer one chunk if the transport has one ready, without suspending.
    /// Returns the number of newly buffered bytes, `0` when nothing is ready.
    fn try_fill(&mut self) -> usize;

    /// Move up to `buf.len()` already-buffered bytes into `buf`, returning
    /// the count moved.
    fn read_buffered(&mut self, buf: &mut [u8]) -> usize;

    /// Graceful release of an idle connection.
    fn flush(&mut self) -> impl std::future::Future<Output = ()> + Send;

    /// Immediate release of a mid-transfer connection.
    fn abort(&mut self);
}
