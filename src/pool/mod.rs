// src/pool/mod.rs

pub mod instance;
pub mod supervisor;

pub use instance::{ExitCodeContract, ProcessStatus, WorkerInstance};
pub use supervisor::{PoolSettings, WorkerGroup, WorkerPool};
