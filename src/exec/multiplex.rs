// src/exec/multiplex.rs

//! Bounded-poll draining of child pipes.
//!
//! A [`PipeDrain`] wraps one readable end of a child pipe and reads whatever
//! is available in short bounded waits: each poll blocks for at most
//! [`POLL_INTERVAL`] waiting for readability, appends any bytes it got, and
//! returns. Callers loop over several drains and check their own deadline
//! between passes, so no single await can stall an invocation.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Instant, timeout};

/// Upper bound on how long one poll waits for a pipe to become readable.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How much is read from a readable pipe per poll.
const READ_CHUNK: usize = 8192;

/// Why [`drain_until_deadline`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Both streams reached end-of-stream.
    Completed,
    /// The deadline passed with at least one stream still open.
    DeadlineExpired,
}

/// One readable child pipe plus everything read from it so far.
pub struct PipeDrain<R> {
    stream: R,
    buf: Vec<u8>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> PipeDrain<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            buf: Vec::new(),
            eof: false,
        }
    }

    /// True once the stream has reported end-of-stream.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Everything read so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the drain, keeping the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Wait at most [`POLL_INTERVAL`] for readability and append whatever is
    /// available. Returns the number of bytes appended; 0 means the stream
    /// was idle for the whole poll window or has reached end-of-stream.
    pub async fn poll_once(&mut self) -> io::Result<usize> {
        if self.eof {
            return Ok(0);
        }

        let mut chunk = [0u8; READ_CHUNK];
        match timeout(POLL_INTERVAL, self.stream.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                self.eof = true;
                Ok(0)
            }
            Ok(Ok(n)) => {
                self.buf.extend_from_slice(&chunk[..n]);
                Ok(n)
            }
            Ok(Err(err)) => Err(err),
            // Nothing became readable within the poll window. The read
            // future is cancel-safe, so no bytes were lost.
            Err(_elapsed) => Ok(0),
        }
    }
}

/// Drain both output streams of a child until each reports end-of-stream or
/// the deadline passes, alternating one bounded poll per stream per pass
/// (stdout first).
pub async fn drain_until_deadline<R1, R2>(
    stdout: &mut PipeDrain<R1>,
    stderr: &mut PipeDrain<R2>,
    deadline: Instant,
) -> io::Result<DrainOutcome>
where
    R1: AsyncRead + Unpin,
    R2: AsyncRead + Unpin,
{
    loop {
        stdout.poll_once().await?;
        stderr.poll_once().await?;

        if stdout.is_eof() && stderr.is_eof() {
            return Ok(DrainOutcome::Completed);
        }

        if Instant::now() >= deadline {
            return Ok(DrainOutcome::DeadlineExpired);
        }
    }
}
