//! Contention harness CLI
//!
//! Runs the contending-client scenario against the in-memory store and
//! reports whether mutual exclusion held.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keylock_core::{LockConfig, LockManager, MemoryKeyValueStore, RetryPolicy};
use keylock_harness::{run, ContentionConfig};

#[derive(Parser, Debug)]
#[command(name = "keylock-harness", about = "Drive contending workers against one lock key")]
struct Args {
    /// Number of concurrent workers
    #[arg(long, default_value_t = 10, env = "KEYLOCK_WORKERS")]
    workers: usize,

    /// Lock key all workers contend for
    #[arg(long, default_value = "resource", env = "KEYLOCK_KEY")]
    key: String,

    /// Lock TTL in milliseconds
    #[arg(long, default_value_t = 30_000, env = "KEYLOCK_TTL_MS")]
    ttl_ms: u64,

    /// Exclusive work duration in milliseconds
    #[arg(long, default_value_t = 100, env = "KEYLOCK_HOLD_MS")]
    hold_ms: u64,

    /// Per-worker acquisition deadline in milliseconds
    #[arg(long, default_value_t = 60_000, env = "KEYLOCK_DEADLINE_MS")]
    deadline_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let store = Arc::new(MemoryKeyValueStore::new().with_cleanup(Duration::from_secs(1)));
    let manager = Arc::new(LockManager::with_config(
        store,
        LockConfig::default().with_default_ttl_ms(args.ttl_ms),
    ));

    let config = ContentionConfig::default()
        .with_workers(args.workers)
        .with_lock_key(args.key)
        .with_ttl_ms(args.ttl_ms)
        .with_hold(Duration::from_millis(args.hold_ms))
        .with_retry(
            RetryPolicy::default().with_deadline(Duration::from_millis(args.deadline_ms)),
        );

    info!(workers = config.workers, key = %config.lock_key, "starting contention run");
    let report = run(manager.clone(), config).await;

    info!(
        holds = report.spans.len(),
        starved = report.starved_workers,
        rejected_releases = report.failed_releases,
        "contention run finished"
    );
    println!("{}", serde_json::to_string_pretty(&manager.stats())?);

    let overlaps = report.overlaps();
    if overlaps.is_empty() {
        info!("mutual exclusion held: no overlapping exclusive sections");
        Ok(())
    } else {
        anyhow::bail!("mutual exclusion violated: overlapping workers {overlaps:?}");
    }
}
