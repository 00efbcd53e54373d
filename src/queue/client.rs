// src/queue/client.rs

//! Narrow call interface onto the external job broker.
//!
//! The broker owns all interesting behaviour — queueing, priority dispatch,
//! job bookkeeping — and is consumed here only through [`QueueClient`].
//! Production code plugs a real broker client in behind the trait; tests
//! use a fake that records submissions (see `procherd-test-utils`).

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

/// Priority a job is submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Normal,
    High,
    VeryHigh,
}

/// Opaque handle identifying a submitted background job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(pub String);

/// Status of a background job as reported by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobStatus {
    /// Whether the broker knows the job at all.
    pub known: bool,
    /// Whether the job is still in flight.
    pub running: bool,
    /// Numerator of the fractional completion the job reported.
    pub numerator: u64,
    /// Denominator of the fractional completion the job reported.
    pub denominator: u64,
}

impl JobStatus {
    /// A job counts as running only when the broker both knows it and
    /// reports it in flight.
    pub fn is_running(&self) -> bool {
        self.known && self.running
    }
}

/// Trait abstracting the broker client.
pub trait QueueClient: Send {
    /// Submit `payload` on `queue` and wait for the result bytes.
    fn submit<'a>(
        &'a mut self,
        queue: &'a str,
        payload: &'a [u8],
        priority: Priority,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;

    /// Submit `payload` on `queue` to run in the background; returns the
    /// job handle to poll with [`job_status`](Self::job_status).
    fn submit_async<'a>(
        &'a mut self,
        queue: &'a str,
        payload: &'a [u8],
        priority: Priority,
    ) -> Pin<Box<dyn Future<Output = Result<JobHandle>> + Send + 'a>>;

    /// Look up the status of a background job.
    fn job_status<'a>(
        &'a mut self,
        handle: &'a JobHandle,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus>> + Send + 'a>>;
}
