// src/exec/mod.rs

pub mod multiplex;
pub mod shell;

pub use multiplex::{DrainOutcome, PipeDrain, POLL_INTERVAL};
pub use shell::{DEFAULT_TIMEOUT_SECS, ShellRunner};
