//! Contending-client harness
//!
//! Drives N independent workers against a single lock key to exercise and
//! validate the mutual-exclusion guarantee. Each worker mints its own token,
//! polls for the lock under a retry policy, holds it for a fixed work
//! duration, then releases it. The harness records every hold as an
//! enter/exit span; the safety property is that no two spans overlap.
//!
//! Liveness is probabilistic: there is no fairness queue, so a worker can
//! exhaust its retry budget without ever holding the lock. Such workers are
//! reported, not retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use keylock_common::new_token;
use keylock_core::{LockManager, RetryPolicy};

/// Configuration for a contention run
#[derive(Debug, Clone)]
pub struct ContentionConfig {
    /// Number of concurrent workers
    pub workers: usize,
    /// The single key all workers contend for
    pub lock_key: String,
    /// TTL of each acquisition, in milliseconds
    pub ttl_ms: u64,
    /// Exclusive work duration while holding the lock
    pub hold: Duration,
    /// Retry policy each worker polls under
    pub retry: RetryPolicy,
}

impl Default for ContentionConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            lock_key: "resource".to_string(),
            ttl_ms: 30_000,
            hold: Duration::from_millis(100),
            retry: RetryPolicy::default().with_deadline(Duration::from_secs(30)),
        }
    }
}

impl ContentionConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_lock_key(mut self, lock_key: impl Into<String>) -> Self {
        self.lock_key = lock_key.into();
        self
    }

    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// One completed exclusive-work section
#[derive(Debug, Clone)]
pub struct HoldSpan {
    pub worker: usize,
    pub token: String,
    pub entered_at: Instant,
    pub exited_at: Instant,
}

/// Outcome of a contention run
#[derive(Debug)]
pub struct ContentionReport {
    /// Completed holds, in entry order
    pub spans: Vec<HoldSpan>,
    /// Workers that exhausted their retry budget without the lock
    pub starved_workers: usize,
    /// Workers whose release was rejected (expired mid-hold)
    pub failed_releases: usize,
}

impl ContentionReport {
    /// Pairs of workers whose exclusive sections overlapped in time
    ///
    /// An empty result is the mutual-exclusion safety property.
    pub fn overlaps(&self) -> Vec<(usize, usize)> {
        let mut spans: Vec<&HoldSpan> = self.spans.iter().collect();
        spans.sort_by_key(|s| s.entered_at);

        let mut overlapping = Vec::new();
        for pair in spans.windows(2) {
            if pair[1].entered_at < pair[0].exited_at {
                overlapping.push((pair[0].worker, pair[1].worker));
            }
        }
        overlapping
    }

    pub fn is_exclusive(&self) -> bool {
        self.overlaps().is_empty()
    }
}

/// Run the contention scenario
///
/// Spawns `config.workers` tasks against `config.lock_key` and waits for
/// all of them to finish.
pub async fn run(manager: Arc<LockManager>, config: ContentionConfig) -> ContentionReport {
    if config.ttl_ms <= config.hold.as_millis() as u64 {
        warn!(
            ttl_ms = config.ttl_ms,
            hold_ms = config.hold.as_millis() as u64,
            "lock TTL does not exceed the hold duration; holders may be evicted mid-work"
        );
    }

    let spans = Arc::new(Mutex::new(Vec::with_capacity(config.workers)));
    let mut handles = Vec::with_capacity(config.workers);

    for worker in 0..config.workers {
        let manager = manager.clone();
        let spans = spans.clone();
        let config = config.clone();

        handles.push(tokio::spawn(async move {
            worker_loop(worker, manager, &config, spans).await
        }));
    }

    let mut starved_workers = 0;
    let mut failed_releases = 0;
    for handle in handles {
        match handle.await {
            Ok(WorkerOutcome::Held) => {}
            Ok(WorkerOutcome::Starved) => starved_workers += 1,
            Ok(WorkerOutcome::ReleaseRejected) => failed_releases += 1,
            Err(e) => {
                warn!(error = %e, "worker task failed");
                starved_workers += 1;
            }
        }
    }

    let spans = std::mem::take(&mut *spans.lock());
    ContentionReport {
        spans,
        starved_workers,
        failed_releases,
    }
}

enum WorkerOutcome {
    Held,
    Starved,
    ReleaseRejected,
}

async fn worker_loop(
    worker: usize,
    manager: Arc<LockManager>,
    config: &ContentionConfig,
    spans: Arc<Mutex<Vec<HoldSpan>>>,
) -> WorkerOutcome {
    // Fresh token per attempt cycle; never reused across workers
    let token = new_token();

    if !manager
        .acquire_with_retry(&config.lock_key, &token, config.ttl_ms, &config.retry)
        .await
    {
        warn!(worker, key = %config.lock_key, "worker gave up without the lock");
        return WorkerOutcome::Starved;
    }

    info!(worker, key = %config.lock_key, "entering exclusive section");
    let entered_at = Instant::now();

    // The bounded unit of exclusive work
    tokio::time::sleep(config.hold).await;

    let exited_at = Instant::now();
    let released = manager.release(&config.lock_key, &token).await;
    info!(worker, key = %config.lock_key, released, "exited exclusive section");

    spans.lock().push(HoldSpan {
        worker,
        token,
        entered_at,
        exited_at,
    });

    if released {
        WorkerOutcome::Held
    } else {
        WorkerOutcome::ReleaseRejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(worker: usize, base: Instant, enter_ms: u64, exit_ms: u64) -> HoldSpan {
        HoldSpan {
            worker,
            token: format!("token-{worker}"),
            entered_at: base + Duration::from_millis(enter_ms),
            exited_at: base + Duration::from_millis(exit_ms),
        }
    }

    #[test]
    fn test_overlap_detection() {
        let base = Instant::now();
        let report = ContentionReport {
            spans: vec![
                span(0, base, 0, 100),
                span(1, base, 100, 200),
                span(2, base, 150, 300),
            ],
            starved_workers: 0,
            failed_releases: 0,
        };

        assert!(!report.is_exclusive());
        assert_eq!(report.overlaps(), vec![(1, 2)]);
    }

    #[test]
    fn test_disjoint_spans_are_exclusive() {
        let base = Instant::now();
        let report = ContentionReport {
            spans: vec![
                span(2, base, 200, 300),
                span(0, base, 0, 100),
                span(1, base, 100, 200),
            ],
            starved_workers: 0,
            failed_releases: 0,
        };

        assert!(report.is_exclusive());
    }

    #[test]
    fn test_config_builder() {
        let config = ContentionConfig::default()
            .with_workers(3)
            .with_lock_key("jobs/nightly")
            .with_ttl_ms(5_000)
            .with_hold(Duration::from_millis(50));

        assert_eq!(config.workers, 3);
        assert_eq!(config.lock_key, "jobs/nightly");
        assert_eq!(config.ttl_ms, 5_000);
        assert_eq!(config.hold, Duration::from_millis(50));
    }
}
