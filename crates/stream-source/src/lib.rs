//! Resilient, resumable HTTP byte-stream source for audio playback
//! pipelines.
//!
//! This crate exposes [`StreamSource`], a sequential byte reader over an
//! unreliable HTTP transport. It survives transient disconnects without
//! losing its place in the logical stream, resumes at a byte offset when the
//! remote endpoint advertises range support, and offers both blocking and
//! non-blocking reads so a decoder loop is never held up for long.
//!
//! The transport seam lives in [`transport`]; the `reqwest`-backed
//! [`HttpTransport`] is the production implementation. Status transitions
//! (disconnects, reconnect attempts, stalls) are reported through a
//! [`StatusSink`] observer.
//!
//! ```no_run
//! use stream_source::StreamSource;
//!
//! # async fn run() -> stream_source::Result<()> {
//! let mut source = StreamSource::open_url("https://example.com/track.mp3").await?;
//! let mut buf = [0u8; 4096];
//! loop {
//!     let n = source.read(&mut buf).await?;
//!     if n == 0 {
//!         break;
//!     }
//!     // feed &buf[..n] to the decoder
//! }
//! source.close().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod settings;
mod source;
mod status;
pub mod transport;

pub use crate::error::{Error, Result};
pub use crate::settings::Settings;
pub use crate::source::StreamSource;
pub use crate::status::{StatusSink, StreamStatus, TracingSink};
pub use crate::transport::http::{HttpConnection, HttpTransport};
pub use crate::transport::{Connection, ContentLength, ProbeInfo, RangeSupport, Transport};
