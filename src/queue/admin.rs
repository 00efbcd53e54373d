// src/queue/admin.rs

//! Queue status over the broker's textual admin socket.

use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::errors::{ProcherdError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// One record of the broker's `status` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatusLine {
    pub queue: String,
    pub jobs_waiting: u64,
    pub jobs_running: u64,
    pub available_workers: u64,
}

/// Client for the broker's line-based admin protocol.
pub struct QueueAdmin {
    addr: String,
}

impl QueueAdmin {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Send a `status` request and collect the answer table.
    ///
    /// The broker answers with newline-delimited tab-separated records
    /// (`queue \t waiting \t running \t available_workers`) and terminates
    /// the listing with a line consisting solely of `.`.
    pub async fn queue_status(&self) -> Result<Vec<QueueStatusLine>> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| ProcherdError::BrokerTimeout(format!("connecting to {}", self.addr)))?
            .with_context(|| format!("connecting to broker admin socket {}", self.addr))?;

        let mut stream = BufReader::new(stream);
        stream
            .get_mut()
            .write_all(b"status\n")
            .await
            .context("sending status request")?;

        let mut records = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            let n = timeout(READ_TIMEOUT, stream.read_line(&mut line))
                .await
                .map_err(|_| {
                    ProcherdError::BrokerTimeout(format!(
                        "waiting for status answer from {}",
                        self.addr
                    ))
                })?
                .context("reading status answer")?;

            if n == 0 {
                // Broker closed the socket before the terminator.
                debug!(addr = %self.addr, "status stream ended without terminator");
                break;
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed == "." {
                break;
            }

            records.push(parse_status_line(trimmed));
        }

        Ok(records)
    }
}

/// Parse one tab-separated status record.
///
/// Lenient on purpose: brokers disagree on trailing fields, so missing or
/// garbled numeric fields default to 0.
pub fn parse_status_line(line: &str) -> QueueStatusLine {
    let mut fields = line.split('\t');
    let queue = fields.next().unwrap_or("").to_string();
    let mut next_num = || {
        fields
            .next()
            .and_then(|f| f.trim().parse::<u64>().ok())
            .unwrap_or(0)
    };

    QueueStatusLine {
        queue,
        jobs_waiting: next_num(),
        jobs_running: next_num(),
        available_workers: next_num(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_records_parse_field_by_field() {
        let parsed = parse_status_line("resize\t4\t2\t8");
        assert_eq!(
            parsed,
            QueueStatusLine {
                queue: "resize".to_string(),
                jobs_waiting: 4,
                jobs_running: 2,
                available_workers: 8,
            }
        );
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let parsed = parse_status_line("mail\t7");
        assert_eq!(parsed.queue, "mail");
        assert_eq!(parsed.jobs_waiting, 7);
        assert_eq!(parsed.jobs_running, 0);
        assert_eq!(parsed.available_workers, 0);
    }

    #[test]
    fn garbled_numbers_default_to_zero() {
        let parsed = parse_status_line("q\tmany\t-3\t2");
        assert_eq!(parsed.jobs_waiting, 0);
        assert_eq!(parsed.jobs_running, 0);
        assert_eq!(parsed.available_workers, 2);
    }

    #[test]
    fn empty_lines_become_empty_records() {
        let parsed = parse_status_line("");
        assert_eq!(parsed.queue, "");
        assert_eq!(parsed.jobs_waiting, 0);
    }
}
