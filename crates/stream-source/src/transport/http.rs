//! `reqwest`-backed [`Transport`] implementation.
//!
//! One [`HttpConnection`] wraps one streamed response body. Bytes are pulled
//! chunk-by-chunk into an internal buffer; a cleanly finished body keeps the
//! connection "connected" (the socket goes back to the pool), while a body
//! read error marks it disconnected so the source can start its reconnect
//! cycle.

use bytes::{Bytes, BytesMut};
use futures_util::FutureExt;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

use super::{Connection, ContentLength, ProbeInfo, Transport};

/// HTTP transport sharing one `reqwest::Client` across requests.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with a custom `reqwest::Client` (timeouts, proxies,
    /// connection pooling).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn into_connection(response: Response, url: &Url, ranged: bool) -> Result<HttpConnection> {
        let status = response.status();
        let ok = if ranged {
            status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT
        } else {
            status.is_success()
        };
        if !ok {
            return Err(Error::OpenFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        trace!(%url, %status, ranged, "response opened");
        let content_length = response_length(&response);
        Ok(HttpConnection {
            response: Some(response),
            buffer: BytesMut::new(),
            content_length,
            connected: true,
        })
    }
}

/// Length reported by a response.
///
/// The `Content-Length` header is preferred over the body size hint: a HEAD
/// response carries the header while its body is empty.
fn response_length(response: &Response) -> ContentLength {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .or_else(|| response.content_length())
        .into()
}

impl Transport for HttpTransport {
    type Conn = HttpConnection;

    async fn get(&self, url: &Url) -> Result<HttpConnection> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(Error::transport)?;
        Self::into_connection(response, url, false)
    }

    async fn get_range(&self, url: &Url, start: u64, end: Option<u64>) -> Result<HttpConnection> {
        let range = match end {
            Some(end) => format!("bytes={start}-{end}"),
            None => format!("bytes={start}-"),
        };
        debug!(%url, range, "issuing ranged request");
        let response = self
            .client
            .get(url.clone())
            .header(RANGE, range)
            .send()
            .await
            .map_err(Error::transport)?;
        Self::into_connection(response, url, true)
    }

    async fn probe(&self, url: &Url) -> Result<ProbeInfo> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(Error::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::OpenFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let accepts_ranges = response
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("bytes"));
        Ok(ProbeInfo {
            accepts_ranges,
            content_length: response_length(&response),
        })
    }
}

/// One streamed HTTP response body.
#[derive(Debug)]
pub struct HttpConnection {
    response: Option<Response>,
    buffer: BytesMut,
    content_length: ContentLength,
    connected: bool,
}

impl HttpConnection {
    fn buffer_chunk(&mut self, chunk: Bytes) -> usize {
        self.buffer.extend_from_slice(&chunk);
        chunk.len()
    }

    fn handle_chunk(&mut self, chunk: reqwest::Result<Option<Bytes>>) -> usize {
        match chunk {
            Ok(Some(chunk)) => self.buffer_chunk(chunk),
            Ok(None) => {
                // Clean end of body: the socket returns to the pool, so the
                // connection itself is still usable.
                trace!("response body finished");
                self.response = None;
                0
            }
            Err(err) => {
                debug!(error = %err, "body read failed");
                self.response = None;
                self.connected = false;
                0
            }
        }
    }
}

impl Connection for HttpConnection {
    fn content_length(&self) -> ContentLength {
        self.content_length
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn available(&self) -> usize {
        self.buffer.len()
    }

    async fn fill(&mut self) -> usize {
        let Some(response) = self.response.as_mut() else {
            return 0;
        };
        let chunk = response.chunk().await;
        self.handle_chunk(chunk)
    }

    fn try_fill(&mut self) -> usize {
        let Some(response) = self.response.as_mut() else {
            return 0;
        };
        // A pending chunk future can be dropped without losing data; nothing
        // has been pulled from the body until it resolves.
        match response.chunk().now_or_never() {
            Some(chunk) => self.handle_chunk(chunk),
            None => 0,
        }
    }

    fn read_buffered(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer.split_to(n));
        n
    }

    async fn flush(&mut self) {
        self.buffer.clear();
        self.response = None;
        self.connected = false;
    }

    fn abort(&mut self) {
        self.buffer.clear();
        self.response = None;
        self.connected = false;
    }
}
