//! Status notifications emitted by [`StreamSource`](crate::StreamSource).
//!
//! The source reports connectivity transitions to an observer as
//! `(status, message)` pairs. Notifications are observational only: the
//! source never blocks on the sink or reacts to its return.
//!
//! Any `Fn(StreamStatus, &str)` closure works as a sink; [`TracingSink`] is
//! the default and turns notifications into structured log lines.

use std::fmt::{self, Display, Formatter};

use tracing::{debug, warn};

/// Connectivity transition reported to the status sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// An open request was answered with a non-success status.
    HttpFail,
    /// The transport was found disconnected, or reconnection was given up.
    Disconnected,
    /// A reconnect attempt is about to be made.
    Reconnecting,
    /// Connectivity was restored.
    Reconnected,
    /// A blocking read saw no data within its poll budget.
    NoData,
}

impl Display for StreamStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamStatus::HttpFail => "http-fail",
            StreamStatus::Disconnected => "disconnected",
            StreamStatus::Reconnecting => "reconnecting",
            StreamStatus::Reconnected => "reconnected",
            StreamStatus::NoData => "no-data",
        };
        f.write_str(name)
    }
}

/// Observer for [`StreamStatus`] notifications.
pub trait StatusSink: Send {
    /// Receive a single status notification.
    fn status(&self, status: StreamStatus, message: &str);
}

impl<F> StatusSink for F
where
    F: Fn(StreamStatus, &str) + Send,
{
    fn status(&self, status: StreamStatus, message: &str) {
        self(status, message);
    }
}

/// Default sink: forwards notifications to `tracing`.
///
/// Hard failures log at `warn`, transient transitions at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn status(&self, status: StreamStatus, message: &str) {
        match status {
            StreamStatus::HttpFail | StreamStatus::Disconnected => {
                warn!(%status, message);
            }
            StreamStatus::Reconnecting | StreamStatus::Reconnected | StreamStatus::NoData => {
                debug!(%status, message);
            }
        }
    }
}
