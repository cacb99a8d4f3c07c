//! Publishing-profile log streaming.
//!
//! The stream is read line by line until it ends or the wall-clock bound
//! elapses. Each read is bounded by the remaining time, so a stream that
//! stalls forever still ends the loop on time.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Response;
use serde::Serialize;
use std::io;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::time::Instant;
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use crate::error::{AzureError, Result, SampleError};

/// An asynchronous source of text lines.
#[async_trait]
pub trait LineSource: Send {
    /// Returns the next line without its terminator, or `None` at the end.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

type BodyReader = Pin<Box<dyn AsyncRead + Send>>;

/// Line reader over a streaming HTTP response body.
///
/// Lines end at `\n`, with a trailing `\r` stripped. A body that is not
/// valid UTF-8 is reported as an invalid response.
pub struct ResponseLines {
    lines: Lines<BufReader<BodyReader>>,
}

impl ResponseLines {
    /// Wraps a response body.
    #[must_use]
    pub fn new(response: Response) -> Self {
        let body = response.bytes_stream().map_err(io::Error::other);
        let reader: BodyReader = Box::pin(StreamReader::new(body));
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }
}

#[async_trait]
impl LineSource for ResponseLines {
    async fn next_line(&mut self) -> Result<Option<String>> {
        self.lines.next_line().await.map_err(|e| {
            SampleError::Azure(if e.kind() == io::ErrorKind::InvalidData {
                AzureError::invalid_response(format!("Log stream is not valid UTF-8: {e}"))
            } else {
                AzureError::network(format!("Log stream read failed: {e}"))
            })
        })
    }
}

/// How a read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamEnd {
    /// The stream yielded no more lines.
    Exhausted,
    /// The wall-clock bound elapsed first.
    TimedOut,
}

/// Result of a read loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    /// Number of lines read.
    pub lines_read: usize,
    /// How the loop ended.
    pub end: StreamEnd,
    /// Time spent in the loop, in milliseconds.
    pub elapsed_ms: u64,
}

/// Reads a line source for a bounded time.
#[derive(Debug, Clone, Copy)]
pub struct LogStreamer {
    /// Upper bound on the loop.
    timeout: Duration,
}

impl LogStreamer {
    /// Creates a streamer bounded by `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Reads and logs lines until the source ends or the bound elapses. The
    /// source is dropped when the loop exits.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the source fails.
    pub async fn stream(&self, mut source: Box<dyn LineSource>) -> Result<StreamSummary> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut lines_read = 0;

        let end = loop {
            match tokio::time::timeout_at(deadline, source.next_line()).await {
                Err(_) => {
                    debug!("Log stream bound of {:?} reached", self.timeout);
                    break StreamEnd::TimedOut;
                }
                Ok(Ok(Some(line))) => {
                    lines_read += 1;
                    info!("{line}");
                }
                Ok(Ok(None)) => break StreamEnd::Exhausted,
                Ok(Err(e)) => return Err(e),
            }
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!("Log stream closed after {lines_read} lines ({end:?})");

        Ok(StreamSummary {
            lines_read,
            end,
            elapsed_ms,
        })
    }
}
