// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcherdError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("command execution timeout on: {command}")]
    CommandTimeout { command: String },

    #[error("timeout killing workers after {rounds} round(s)")]
    KillWorkersTimeout { rounds: u64 },

    #[error("there are one or more workers running yet: {0}")]
    WorkersRunningYet(String),

    #[error("broker did not answer in time: {0}")]
    BrokerTimeout(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProcherdError>;
