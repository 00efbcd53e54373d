use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use procherd::errors::Result;
use procherd::queue::{JobHandle, JobStatus, Priority, QueueClient};

/// A fake broker client that:
/// - records which (queue, priority) submissions happened
/// - answers every submission immediately (result = the payload echoed back).
pub struct FakeBroker {
    submitted: Arc<Mutex<Vec<(String, Priority)>>>,
    status: JobStatus,
}

impl FakeBroker {
    pub fn new(submitted: Arc<Mutex<Vec<(String, Priority)>>>) -> Self {
        Self {
            submitted,
            status: JobStatus {
                known: true,
                running: false,
                numerator: 0,
                denominator: 0,
            },
        }
    }

    /// Answer every `job_status` call with `status`.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }
}

impl QueueClient for FakeBroker {
    fn submit<'a>(
        &'a mut self,
        queue: &'a str,
        payload: &'a [u8],
        priority: Priority,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        let submitted = Arc::clone(&self.submitted);

        Box::pin(async move {
            submitted.lock().unwrap().push((queue.to_string(), priority));
            Ok(payload.to_vec())
        })
    }

    fn submit_async<'a>(
        &'a mut self,
        queue: &'a str,
        _payload: &'a [u8],
        priority: Priority,
    ) -> Pin<Box<dyn Future<Output = Result<JobHandle>> + Send + 'a>> {
        let submitted = Arc::clone(&self.submitted);

        Box::pin(async move {
            let mut guard = submitted.lock().unwrap();
            guard.push((queue.to_string(), priority));
            Ok(JobHandle(format!("H:{}:{}", queue, guard.len())))
        })
    }

    fn job_status<'a>(
        &'a mut self,
        _handle: &'a JobHandle,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus>> + Send + 'a>> {
        let status = self.status;
        Box::pin(async move { Ok(status) })
    }
}
