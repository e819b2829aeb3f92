//! The resumable byte-stream source.
//!
//! [`StreamSource`] owns one transport connection at a time and tracks the
//! logical position of the bytes it has delivered. A caller (typically an
//! audio decoder loop) repeatedly issues blocking or non-blocking reads; the
//! source lazily reconnects when the transport reports disconnection,
//! re-issuing the request that produced the last successful open.
//!
//! Reconnection resumes at the current logical position whenever the remote
//! resource supports byte ranges: the reconnect path probes for
//! `Accept-Ranges` and issues a ranged request from the consumed position.
//! When ranges are not supported the stream restarts from byte zero and the
//! position resets with it.
//!
//! Suspension happens only inside the blocking-read wait (bounded by
//! [`Settings::read_timeout`]) and the pause between reconnect attempts;
//! both yield to the async executor rather than blocking the thread. There
//! is no cancellation primitive: a blocking read or a reconnect sequence
//! runs to completion or exhaustion.
//!
//! Dropping the source releases the connection; an in-flight body is simply
//! abandoned.

use std::io::SeekFrom;

use tokio::time::{sleep, timeout};
use tracing::{debug, instrument, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::status::{StatusSink, StreamStatus, TracingSink};
use crate::transport::http::HttpTransport;
use crate::transport::{Connection, ContentLength, RangeSupport, Transport};

/// Resilient, resumable byte-stream reader over an unreliable transport.
///
/// Single logical flow only: `&mut self` on every operation is the
/// reentrancy contract.
pub struct StreamSource<T: Transport = HttpTransport> {
    transport: T,
    conn: Option<T::Conn>,
    /// Locator that produced the last successful open; reused verbatim by
    /// reconnects.
    locator: Option<Url>,
    position: u64,
    content_length: ContentLength,
    range_support: RangeSupport,
    settings: Settings,
    sink: Box<dyn StatusSink>,
}

impl StreamSource<HttpTransport> {
    /// Create a detached source over a default HTTP transport.
    pub fn new(settings: Settings) -> Self {
        Self::with_transport(HttpTransport::new(), settings)
    }

    /// Build a source with default settings and open `locator` in one call.
    pub async fn open_url(locator: &str) -> Result<Self> {
        let mut source = Self::new(Settings::default());
        source.open(locator).await?;
        Ok(source)
    }

    /// Build a source with default settings and open `locator` at `offset`,
    /// falling back to a full stream when ranges are unavailable.
    pub async fn open_url_at(locator: &str, offset: u64) -> Result<Self> {
        let mut source = Self::new(Settings::default());
        source.open_at(locator, offset).await?;
        Ok(source)
    }
}

impl<T: Transport> StreamSource<T> {
    /// Create a detached source over a caller-supplied transport.
    pub fn with_transport(transport: T, settings: Settings) -> Self {
        Self {
            transport,
            conn: None,
            locator: None,
            position: 0,
            content_length: ContentLength::Unknown,
            range_support: RangeSupport::Unknown,
            settings,
            sink: Box::new(TracingSink),
        }
    }

    /// Replace the status sink (builder form).
    #[must_use]
    pub fn with_status_sink(mut self, sink: impl StatusSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Replace the status sink.
    pub fn set_status_sink(&mut self, sink: impl StatusSink + 'static) {
        self.sink = Box::new(sink);
    }

    /// Open `locator` from the beginning with a full request.
    #[instrument(skip(self))]
    pub async fn open(&mut self, locator: &str) -> Result<()> {
        let url = Url::parse(locator)?;
        self.range_support = RangeSupport::Unknown;
        self.open_full(url).await
    }

    /// Open `locator` at a byte offset.
    ///
    /// Probes for range support first. If the probe fails, or the resource
    /// does not advertise byte ranges, this degrades to [`open`](Self::open)
    /// and the stream starts from byte zero. The logical position equals
    /// `offset` only on the range-resumed success path.
    #[instrument(skip(self))]
    pub async fn open_at(&mut self, locator: &str, offset: u64) -> Result<()> {
        let url = Url::parse(locator)?;
        self.open_resumed(url, offset).await
    }

    /// Blocking read: wait up to [`Settings::read_timeout`] for data.
    ///
    /// Returns the number of bytes delivered. Zero means end of stream, an
    /// exhausted reconnect budget, or an empty destination buffer. It is
    /// never an error by itself.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_internal(buf, true).await
    }

    /// Non-blocking read: deliver only what is already available.
    ///
    /// Returns zero immediately when nothing is buffered; this is a normal
    /// empty result, not a failure.
    pub async fn read_non_block(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_internal(buf, false).await
    }

    /// Forward absolute seek, emulated by discard-reads.
    ///
    /// Only `SeekFrom::Start(target)` with `target` past the current
    /// position is supported; anything else is rejected without side
    /// effects.
    #[instrument(skip(self))]
    pub async fn seek(&mut self, pos: SeekFrom) -> Result<()> {
        match pos {
            SeekFrom::Start(target) if target > self.position => {
                let mut scratch = vec![0u8; self.settings.seek_chunk];
                while self.position < target {
                    let want = (target - self.position).min(scratch.len() as u64) as usize;
                    if self.read(&mut scratch[..want]).await? == 0 {
                        return Err(Error::SeekFailed {
                            position: self.position,
                        });
                    }
                }
                Ok(())
            }
            _ => {
                warn!(?pos, "seek rejected: only forward absolute seeks are supported");
                Err(Error::UnsupportedSeek)
            }
        }
    }

    /// Release the connection: gracefully when idle, aborting mid-transfer.
    ///
    /// Flushing a mid-transfer body would wait on data that will never be
    /// consumed, so a connection with buffered unread bytes is aborted
    /// instead. The source can be re-opened afterwards.
    pub async fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if conn.is_connected() && conn.available() == 0 {
                trace!("closing idle stream");
                conn.flush().await;
            } else {
                trace!("aborting mid-transfer stream");
                conn.abort();
            }
        }
    }

    /// Whether the transport currently reports a usable connection.
    pub fn is_open(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| conn.is_connected())
    }

    /// Declared total length of the resource.
    pub fn content_length(&self) -> ContentLength {
        self.content_length
    }

    /// Bytes already delivered to the caller since open/resume.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Range capability learned for the current resource.
    pub fn range_support(&self) -> RangeSupport {
        self.range_support
    }

    async fn open_full(&mut self, url: Url) -> Result<()> {
        self.release();
        match self.transport.get(&url).await {
            Ok(conn) => {
                self.content_length = conn.content_length();
                self.conn = Some(conn);
                self.locator = Some(url);
                self.position = 0;
                Ok(())
            }
            Err(err) => {
                self.sink
                    .status(StreamStatus::HttpFail, "can't open HTTP request");
                Err(err)
            }
        }
    }

    async fn open_resumed(&mut self, url: Url, offset: u64) -> Result<()> {
        if offset == 0 {
            self.range_support = RangeSupport::Unknown;
            return self.open_full(url).await;
        }
        self.release();
        let probe = match self.transport.probe(&url).await {
            Ok(probe) => probe,
            Err(err) => {
                debug!(error = %err, "range probe failed, falling back to a full request");
                return self.open_full(url).await;
            }
        };
        if !probe.accepts_ranges {
            debug!("byte ranges not advertised, falling back to a full request");
            self.range_support = RangeSupport::Unsupported;
            return self.open_full(url).await;
        }
        let end = probe.content_length.known().and_then(|len| len.checked_sub(1));
        match self.transport.get_range(&url, offset, end).await {
            Ok(conn) => {
                self.content_length = probe.content_length;
                self.range_support = RangeSupport::Supported;
                self.conn = Some(conn);
                self.locator = Some(url);
                self.position = offset;
                Ok(())
            }
            Err(err) => {
                self.sink
                    .status(StreamStatus::HttpFail, "can't open HTTP request");
                Err(err)
            }
        }
    }

    async fn read_internal(&mut self, buf: &mut [u8], blocking: bool) -> Result<usize> {
        if buf.is_empty() {
            warn!("read called with an empty destination buffer");
            return Ok(0);
        }
        if self.locator.is_none() && self.conn.is_none() {
            return Err(Error::NotOpen);
        }
        loop {
            if !self.is_open() {
                match self.reconnect().await {
                    Ok(()) => {}
                    Err(Error::NotOpen) => return Err(Error::NotOpen),
                    Err(err) => {
                        debug!(error = %err, "read giving up");
                        return Ok(0);
                    }
                }
            }

            // End of stream once the declared length has been delivered.
            if let ContentLength::Known(len) = self.content_length {
                if self.position >= len {
                    return Ok(0);
                }
            }

            // Never request past the declared end.
            let want = match self.content_length {
                ContentLength::Known(len) => (len - self.position).min(buf.len() as u64) as usize,
                ContentLength::Unknown => buf.len(),
            };

            let Some(conn) = self.conn.as_mut() else {
                continue;
            };

            if blocking {
                let _ = timeout(self.settings.read_timeout, fill_until(conn, want)).await;
            } else {
                while conn.try_fill() > 0 {}
            }

            let available = conn.available();
            if available == 0 {
                if !blocking {
                    return Ok(0);
                }
                // Stall: distinguish "momentarily empty" from "disconnected"
                // by forcing a reconnect cycle instead of returning zero.
                self.sink
                    .status(StreamStatus::NoData, "no stream data available");
                self.release();
                continue;
            }

            let n = conn.read_buffered(&mut buf[..want.min(available)]);
            self.position += n as u64;
            trace!(n, position = self.position, "delivered");
            return Ok(n);
        }
    }

    /// Bounded reconnect cycle; resumes at the consumed position when the
    /// resource supports ranges.
    #[instrument(skip(self), fields(position = self.position))]
    async fn reconnect(&mut self) -> Result<()> {
        self.sink
            .status(StreamStatus::Disconnected, "stream disconnected");
        self.release();
        let Some(url) = self.locator.clone() else {
            return Err(Error::NotOpen);
        };
        let budget = self.settings.reconnect_budget;
        for attempt in 1..=budget {
            self.sink.status(
                StreamStatus::Reconnecting,
                &format!("attempting to reconnect, try {attempt}"),
            );
            sleep(self.settings.reconnect_delay).await;
            let result = if self.position > 0 {
                self.open_resumed(url.clone(), self.position).await
            } else {
                self.open_full(url.clone()).await
            };
            match result {
                Ok(()) => {
                    self.sink
                        .status(StreamStatus::Reconnected, "stream reconnected");
                    return Ok(());
                }
                Err(err) => debug!(attempt, error = %err, "reconnect attempt failed"),
            }
        }
        self.sink
            .status(StreamStatus::Disconnected, "unable to reconnect");
        Err(Error::ReconnectExhausted { attempts: budget })
    }

    fn release(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.abort();
        }
    }
}

async fn fill_until<C: Connection>(conn: &mut C, want: usize) {
    while conn.available() < want {
        if conn.fill().await == 0 {
            break;
        }
    }
}
