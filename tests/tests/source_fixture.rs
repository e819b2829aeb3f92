//! Scripted in-memory transport for state-machine tests.
//!
//! `MockTransport` serves a fixed byte blob and can be scripted to fail
//! opens, refuse range support, fail the metadata probe, starve a
//! connection (deliver nothing), or kill a connection once it has served a
//! given number of bytes. Every request is recorded so tests can assert on
//! the exact request sequence (e.g. that a resumed stream asked for the
//! right start offset).
//!
//! `RecordingSink` captures status notifications for sequence assertions.

use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use stream_source::{
    Connection, ContentLength, Error, ProbeInfo, Result, StatusSink, StreamStatus, Transport,
};
use url::Url;

/// One request observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRequest {
    Get,
    GetRange { start: u64, end: Option<u64> },
    Probe,
}

/// Scripted behavior knobs. "Next connection" knobs are consumed when the
/// connection is created, so a reconnected stream sees a healthy server.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Advertise `Accept-Ranges: bytes` from the probe.
    pub accept_ranges: bool,
    /// Fail the metadata probe outright.
    pub probe_fails: bool,
    /// Report no content length on responses and probes.
    pub unknown_length: bool,
    /// Fail this many upcoming open attempts (GET or ranged GET).
    pub fail_opens: u32,
    /// Kill the next connection once it has served this many bytes.
    pub drop_connection_after: Option<u64>,
    /// The next connection never delivers data.
    pub starve_next: bool,
    /// Bytes released per fill.
    pub chunk: usize,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            accept_ranges: true,
            probe_fails: false,
            unknown_length: false,
            fail_opens: 0,
            drop_connection_after: None,
            starve_next: false,
            chunk: 64,
        }
    }
}

pub struct MockState {
    pub data: Bytes,
    pub behavior: MockBehavior,
    pub requests: Vec<MockRequest>,
    pub flushed: u32,
    pub aborted: u32,
}

/// Transport double sharing scripted state with the test body.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                data: data.into(),
                behavior: MockBehavior::default(),
                requests: Vec::new(),
                flushed: 0,
                aborted: 0,
            })),
        }
    }

    pub fn script(&self, f: impl FnOnce(&mut MockBehavior)) {
        f(&mut self.state.lock().unwrap().behavior);
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn flushed(&self) -> u32 {
        self.state.lock().unwrap().flushed
    }

    pub fn aborted(&self) -> u32 {
        self.state.lock().unwrap().aborted
    }

    fn connect(&self, start: u64, end: Option<u64>) -> Result<MockConn> {
        let mut state = self.state.lock().unwrap();
        if state.behavior.fail_opens > 0 {
            state.behavior.fail_opens -= 1;
            return Err(Error::OpenFailed {
                status: 503,
                url: "mock".into(),
            });
        }
        let len = state.data.len() as u64;
        if start > len {
            return Err(Error::OpenFailed {
                status: 416,
                url: "mock".into(),
            });
        }
        let end = end.map_or(len, |e| (e + 1).min(len));
        let content_length = if state.behavior.unknown_length {
            ContentLength::Unknown
        } else {
            ContentLength::Known(len)
        };
        let drop_at = state.behavior.drop_connection_after.take();
        let starve = std::mem::take(&mut state.behavior.starve_next);
        Ok(MockConn {
            data: state.data.clone(),
            cursor: start as usize,
            end: end as usize,
            buffer: BytesMut::new(),
            connected: drop_at != Some(0),
            content_length,
            drop_at: drop_at.map(|n| (start + n) as usize),
            starve,
            chunk: state.behavior.chunk,
            state: Arc::clone(&self.state),
        })
    }
}

impl Transport for MockTransport {
    type Conn = MockConn;

    async fn get(&self, _url: &Url) -> Result<MockConn> {
        self.state.lock().unwrap().requests.push(MockRequest::Get);
        self.connect(0, None)
    }

    async fn get_range(&self, _url: &Url, start: u64, end: Option<u64>) -> Result<MockConn> {
        self.state
            .lock()
            .unwrap()
            .requests
            .push(MockRequest::GetRange { start, end });
        self.connect(start, end)
    }

    async fn probe(&self, _url: &Url) -> Result<ProbeInfo> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(MockRequest::Probe);
        if state.behavior.probe_fails {
            return Err(Error::OpenFailed {
                status: 500,
                url: "mock".into(),
            });
        }
        let content_length = if state.behavior.unknown_length {
            ContentLength::Unknown
        } else {
            ContentLength::Known(state.data.len() as u64)
        };
        Ok(ProbeInfo {
            accepts_ranges: state.behavior.accept_ranges,
            content_length,
        })
    }
}

pub struct MockConn {
    data: Bytes,
    cursor: usize,
    end: usize,
    buffer: BytesMut,
    connected: bool,
    content_length: ContentLength,
    drop_at: Option<usize>,
    starve: bool,
    chunk: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockConn {
    fn produce(&mut self) -> usize {
        if !self.connected {
            return 0;
        }
        if let Some(drop_at) = self.drop_at {
            if self.cursor >= drop_at {
                self.connected = false;
                return 0;
            }
        }
        if self.cursor >= self.end {
            // Clean end of body; the connection itself stays usable.
            return 0;
        }
        let mut take = self.chunk.min(self.end - self.cursor);
        if let Some(drop_at) = self.drop_at {
            take = take.min(drop_at - self.cursor);
        }
        self.buffer
            .extend_from_slice(&self.data[self.cursor..self.cursor + take]);
        self.cursor += take;
        take
    }
}

impl Connection for MockConn {
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
        if self.starve {
            // Simulates a peer that keeps the socket open but sends nothing;
            // only the caller's timeout gets the test out of here.
            std::future::pending::<()>().await;
        }
        self.produce()
    }

    fn try_fill(&mut self) -> usize {
        if self.starve {
            return 0;
        }
        self.produce()
    }

    fn read_buffered(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer.split_to(n));
        n
    }

    async fn flush(&mut self) {
        self.state.lock().unwrap().flushed += 1;
        self.buffer.clear();
        self.connected = false;
    }

    fn abort(&mut self) {
        self.state.lock().unwrap().aborted += 1;
        self.buffer.clear();
        self.connected = false;
    }
}

/// Status sink capturing every notification for later assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<(StreamStatus, String)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(StreamStatus, String)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, status: StreamStatus) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == status)
            .count()
    }

    pub fn last(&self) -> Option<StreamStatus> {
        self.events.lock().unwrap().last().map(|(s, _)| *s)
    }
}

impl StatusSink for RecordingSink {
    fn status(&self, status: StreamStatus, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push((status, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serves_scripted_chunks() {
        let transport = MockTransport::new(vec![7u8; 100]);
        let mut conn = transport.connect(0, None).unwrap();
        assert_eq!(conn.try_fill(), 64);
        assert_eq!(conn.try_fill(), 36);
        assert_eq!(conn.try_fill(), 0);
        assert!(conn.is_connected(), "clean EOF must stay connected");
    }

    #[test]
    fn mock_kills_connection_at_threshold() {
        let transport = MockTransport::new(vec![7u8; 100]);
        transport.script(|b| b.drop_connection_after = Some(64));
        let mut conn = transport.connect(0, None).unwrap();
        assert_eq!(conn.try_fill(), 64);
        assert_eq!(conn.try_fill(), 0);
        assert!(!conn.is_connected(), "hitting the threshold must disconnect");
    }
}
