// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5.53", features = ["derive"] }` in `Cargo.toml`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `procherd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procherd",
    version,
    about = "Run bounded shell commands and supervise pools of worker processes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Procherd.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Procherd.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCHERD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run a shell command, print its captured output and exit with its code.
    Exec {
        /// The command line, passed verbatim to the platform shell.
        command: String,

        /// Abort the command after this many seconds (whole seconds, > 0).
        ///
        /// If omitted, the command may run for as long as it likes.
        #[arg(long, value_name = "SECS")]
        timeout: Option<i64>,
    },

    /// Start all configured worker groups and supervise them until Ctrl-C.
    Supervise {
        /// Parse + validate config, print the groups, but don't spawn anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Query queue status from a broker admin socket and print it.
    Queues {
        /// Address of the broker admin socket.
        #[arg(long, value_name = "HOST:PORT", default_value = "127.0.0.1:4730")]
        addr: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
