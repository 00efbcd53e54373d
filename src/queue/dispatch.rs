// src/queue/dispatch.rs

//! Startup-resolved dispatch table for broker workers.
//!
//! A worker binary states exactly which queue names it serves and with
//! what handler; nothing is discovered at runtime.

use std::collections::BTreeMap;

use tracing::info;

use crate::errors::{ProcherdError, Result};

/// Handler invoked with the raw job payload; returns the result bytes.
pub type JobHandler = Box<dyn Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// The set of queues a worker serves plus the job servers it connects to,
/// resolved once at startup.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, JobHandler>,
    job_servers: Vec<String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every queue/handler pair for this worker.
    ///
    /// Registering an empty set is a configuration mistake and fails
    /// immediately.
    pub fn register_handlers(&mut self, handlers: Vec<(String, JobHandler)>) -> Result<()> {
        if handlers.is_empty() {
            return Err(ProcherdError::InvalidArgument(
                "there must be at least one handler to be registered".to_string(),
            ));
        }

        for (name, handler) in handlers {
            info!(queue = %name, "registering handler");
            self.handlers.insert(name, handler);
        }
        Ok(())
    }

    /// Define the list of job servers this worker connects to.
    pub fn set_job_servers(&mut self, servers: Vec<String>) -> Result<()> {
        if servers.is_empty() {
            return Err(ProcherdError::InvalidArgument(
                "invalid job servers list".to_string(),
            ));
        }

        self.job_servers = servers;
        Ok(())
    }

    pub fn job_servers(&self) -> &[String] {
        &self.job_servers
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Check the registry is complete enough to serve jobs.
    pub fn ensure_ready(&self) -> Result<()> {
        if self.handlers.is_empty() {
            return Err(ProcherdError::InvalidArgument(
                "trying to start a worker without a registered handler".to_string(),
            ));
        }
        if self.job_servers.is_empty() {
            return Err(ProcherdError::InvalidArgument(
                "trying to start a worker without a job server".to_string(),
            ));
        }
        Ok(())
    }

    /// Route one job payload to the handler registered for `queue`.
    pub fn dispatch(&self, queue: &str, payload: &[u8]) -> Result<Vec<u8>> {
        let handler = self.handlers.get(queue).ok_or_else(|| {
            ProcherdError::InvalidArgument(format!("no handler registered for queue '{queue}'"))
        })?;
        handler(payload)
    }
}
