//! Walk coordinator - orchestrates the checksum pipeline
//!
//! The coordinator is responsible for:
//! - Setting up both hand-off queues, the worker pool and the aggregator
//! - Walking the root and feeding work items to the pool
//! - Waiting until every produced item has been fully processed
//! - Two-phase shutdown: stop and join the pool, then stop the aggregator
//! - Final statistics

use crate::config::WalkConfig;
use crate::error::{Result, WalkerError, WorkerError};
use crate::sink::ResultSink;
use crate::walker::aggregator::ResultAggregator;
use crate::walker::queue::{result_queue, work_queue, EntryMeta, InFlight, WorkItem};
use crate::walker::throughput::ThroughputCounter;
use crate::walker::worker::WorkerPool;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};
use walkdir::WalkDir;

/// Result of a completed walk
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    /// Entries produced by the walk and handed to the pool
    pub entries_walked: u64,

    /// Regular files checksummed
    pub files_checksummed: u64,

    /// Bytes checksummed (sum of file sizes)
    pub bytes_checksummed: u64,

    /// Directories skipped
    pub dirs_skipped: u64,

    /// Symlinks and special files skipped
    pub other_skipped: u64,

    /// Item-local errors (open/read failures)
    pub item_errors: u64,

    /// Entries the walk itself could not read
    pub walk_errors: u64,

    /// Results written by the sink
    pub results_persisted: u64,

    /// Results the sink rejected
    pub sink_errors: u64,

    /// Time taken for the walk
    pub duration: Duration,

    /// Whether the walk completed (vs was interrupted)
    pub completed: bool,
}

impl WalkResult {
    /// Total errors of every kind
    pub fn errors(&self) -> u64 {
        self.item_errors + self.walk_errors + self.sink_errors
    }
}

/// What the producer side saw
struct Production {
    produced: u64,
    walk_errors: u64,
    completed: bool,
}

/// Coordinates the checksum pipeline
pub struct WalkCoordinator {
    /// Configuration
    config: Arc<WalkConfig>,

    /// Where results go
    sink: Box<dyn ResultSink>,

    /// Interrupt flag (Ctrl-C)
    shutdown: Arc<AtomicBool>,

    /// Shared with the aggregator
    throughput: Arc<ThroughputCounter>,
}

impl WalkCoordinator {
    /// Create a new walk coordinator
    pub fn new(config: WalkConfig, sink: Box<dyn ResultSink>) -> Self {
        Self {
            config: Arc::new(config),
            sink,
            shutdown: Arc::new(AtomicBool::new(false)),
            throughput: Arc::new(ThroughputCounter::new()),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Throughput counter updated by the aggregator
    pub fn throughput(&self) -> Arc<ThroughputCounter> {
        Arc::clone(&self.throughput)
    }

    /// Run the pipeline to completion
    ///
    /// A failure of the walk at its root is fatal and returned as an error,
    /// but only after the pipeline has been shut down in order.
    pub fn run(self) -> Result<WalkResult> {
        let start_time = Instant::now();
        let config = Arc::clone(&self.config);

        // Every pipeline thread logs beneath this span
        let _span = info_span!("walk", root = %config.root.display()).entered();

        info!(
            root = %config.root.display(),
            workers = config.worker_count,
            "Starting checksum walk"
        );

        let (item_tx, item_rx) = work_queue();
        let (result_tx, result_rx) = result_queue();
        let in_flight = InFlight::new();

        let aggregator = ResultAggregator::spawn(
            result_rx,
            self.sink,
            Arc::clone(&self.throughput),
            config.report_interval,
        )?;

        let pool = match WorkerPool::spawn(config.worker_count, item_rx, result_tx, in_flight.clone())
        {
            Ok(pool) => pool,
            Err(e) => {
                let _ = aggregator.shutdown();
                return Err(e.into());
            }
        };

        // Produce work; a fatal walk error still goes through orderly shutdown
        let production = produce(&config, &item_tx, &in_flight, &self.shutdown);

        // Drain barrier: every handed-off item must be acknowledged
        wait_for_drain(&in_flight, config.report_interval);

        // Phase one: stop the pool and wait for every worker
        let pool_stats = pool.shutdown();
        drop(item_tx);

        // Phase two: only now is it safe to stop the aggregator
        let (summary, closed) = aggregator.shutdown()?;

        let production = production?;
        closed?;

        let duration = start_time.elapsed();
        let result = WalkResult {
            entries_walked: production.produced,
            files_checksummed: pool_stats.files_checksummed,
            bytes_checksummed: pool_stats.bytes_checksummed,
            dirs_skipped: pool_stats.dirs_skipped,
            other_skipped: pool_stats.other_skipped,
            item_errors: pool_stats.errors,
            walk_errors: production.walk_errors,
            results_persisted: summary.persisted,
            sink_errors: summary.sink_errors,
            duration,
            completed: production.completed,
        };

        info!(
            entries = result.entries_walked,
            files = result.files_checksummed,
            persisted = result.results_persisted,
            errors = result.errors(),
            duration_secs = duration.as_secs(),
            "Walk completed"
        );

        Ok(result)
    }
}

/// Walk the root and hand every entry to the pool
fn produce(
    config: &WalkConfig,
    item_tx: &Sender<WorkItem>,
    in_flight: &InFlight,
    shutdown: &AtomicBool,
) -> Result<Production> {
    let mut walker = WalkDir::new(&config.root).follow_links(config.follow_links);
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth);
    }

    let mut production = Production {
        produced: 0,
        walk_errors: 0,
        completed: true,
    };

    let entries = walker
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !config.is_excluded(entry.path()));

    for entry in entries {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown signal received, no more work will be produced");
            production.completed = false;
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(WalkerError::Walk {
                    root: config.root.clone(),
                    source: e,
                });
            }
            Err(e) => {
                production.walk_errors += 1;
                warn!(error = %e, "Failed to read entry during walk");
                continue;
            }
        };

        let meta = match entry.metadata() {
            Ok(meta) => EntryMeta::from_metadata(&meta),
            Err(e) => {
                production.walk_errors += 1;
                warn!(path = %entry.path().display(), error = %e, "Failed to stat entry");
                continue;
            }
        };

        let item = WorkItem::new(entry.into_path(), meta);
        debug!(path = %item.path.display(), "Submitting work item");

        in_flight.register();
        if item_tx.send(item).is_err() {
            in_flight.acknowledge();
            return Err(WorkerError::AllWorkersDead.into());
        }
        production.produced += 1;
    }

    Ok(production)
}

/// Block until every produced item is acknowledged
fn wait_for_drain(in_flight: &InFlight, log_interval: Duration) {
    while !in_flight.wait_drained(log_interval) {
        info!(
            outstanding = in_flight.outstanding(),
            "Waiting for in-flight items to finish"
        );
    }
    debug!("All produced items acknowledged");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_result_errors() {
        let result = WalkResult {
            item_errors: 2,
            walk_errors: 1,
            sink_errors: 3,
            ..Default::default()
        };
        assert_eq!(result.errors(), 6);
    }
}
