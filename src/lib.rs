// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pool;
pub mod queue;

use std::io::Write;

use anyhow::Result;
use tracing::info;

use crate::cli::{CliArgs, CliCommand};
use crate::config::{ConfigFile, load_and_validate};
use crate::exec::ShellRunner;
use crate::pool::WorkerPool;
use crate::queue::QueueAdmin;

/// High-level entry point used by `main.rs`.
///
/// Dispatches the subcommand and returns the process exit code for `main`
/// to pass on.
pub async fn run(args: CliArgs) -> Result<i32> {
    match args.command {
        CliCommand::Exec { command, timeout } => run_exec(&command, timeout).await,
        CliCommand::Supervise { dry_run } => run_supervise(&args.config, dry_run).await,
        CliCommand::Queues { addr } => run_queues(&addr).await,
    }
}

/// Run one shell command, mirror its captured output, and hand its exit
/// code back to the caller.
async fn run_exec(command: &str, timeout: Option<i64>) -> Result<i32> {
    let mut runner = ShellRunner::new();

    let outcome = match timeout {
        Some(secs) => runner.run_with_timeout(command, secs).await,
        None => runner.run(command).await,
    };

    // Mirror whatever was captured, even when the command timed out.
    std::io::stdout().write_all(runner.stdout())?;
    std::io::stderr().write_all(runner.stderr())?;

    Ok(outcome?)
}

/// Start all configured worker groups and supervise them until Ctrl-C.
async fn run_supervise(config_path: &str, dry_run: bool) -> Result<i32> {
    let cfg = load_and_validate(config_path)?;

    if dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    let mut pool = WorkerPool::from_config(&cfg);
    pool.start_workers()?;

    info!("worker groups started; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("shutdown requested; killing workers");
    pool.kill_workers().await?;

    Ok(0)
}

/// Print the broker's queue status table.
async fn run_queues(addr: &str) -> Result<i32> {
    let admin = QueueAdmin::new(addr);
    let queues = admin.queue_status().await?;

    if queues.is_empty() {
        println!("no queues reported by {addr}");
        return Ok(0);
    }

    println!(
        "{:<32} {:>8} {:>8} {:>8}",
        "queue", "waiting", "running", "workers"
    );
    for q in &queues {
        println!(
            "{:<32} {:>8} {:>8} {:>8}",
            q.queue, q.jobs_waiting, q.jobs_running, q.available_workers
        );
    }

    Ok(0)
}

/// Simple dry-run output: print supervisor settings and groups.
fn print_dry_run(cfg: &ConfigFile) {
    println!("procherd dry-run");
    println!("  supervisor.log_file = {}", cfg.supervisor.log_file);
    println!(
        "  supervisor.kill_max_rounds = {}",
        cfg.supervisor.kill_max_rounds
    );
    println!(
        "  supervisor.kill_round_delay_ms = {}",
        cfg.supervisor.kill_round_delay_ms
    );
    println!(
        "  supervisor.exit_codes = dont_run:{} sleeping:{}",
        cfg.supervisor.dont_run_exit_code, cfg.supervisor.sleeping_exit_code
    );
    println!();

    println!("groups ({}):", cfg.group.len());
    for (name, group) in cfg.group.iter() {
        println!("  - {name}");
        println!("      path: {}", group.path);
        if !group.args.is_empty() {
            println!("      args: {:?}", group.args);
        }
        println!("      count: {}", group.count);
    }
}
