//! Checksum workers and the fixed-size pool that owns them
//!
//! Each worker:
//! - Pulls work items from the shared inbound queue
//! - Skips directories and anything that is not a regular file
//! - Streams regular files through SHA-256
//! - Hands the result to the aggregator over the outbound queue
//! - Exits when the pool's stop signal fires and no item is waiting
//!
//! A worker that is mid-item always finishes that item before it looks at
//! the stop signal again. Items still queued when the signal fires are
//! abandoned; the coordinator's drain barrier keeps that from happening in
//! a normal run.

use crate::content::checksum_file;
use crate::error::{ItemError, ItemOutcome, SkipReason, WorkerError};
use crate::walker::log_context::LogContext;
use crate::walker::queue::{Acknowledge, InFlight, WorkItem, WorkResult};
use crate::walker::signal::StopSignal;
use crossbeam_channel::{select, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, info_span, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Items received
    pub items_received: AtomicU64,

    /// Files checksummed
    pub files_checksummed: AtomicU64,

    /// Bytes checksummed (sum of file sizes)
    pub bytes_checksummed: AtomicU64,

    /// Directories skipped
    pub dirs_skipped: AtomicU64,

    /// Non-regular entries skipped
    pub other_skipped: AtomicU64,

    /// Item-local errors
    pub errors: AtomicU64,
}

impl WorkerStats {
    fn record_received(&self) {
        self.items_received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_file(&self, bytes: u64) {
        self.files_checksummed.fetch_add(1, Ordering::Relaxed);
        self.bytes_checksummed.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_skip(&self, reason: SkipReason) {
        match reason {
            SkipReason::Directory => self.dirs_skipped.fetch_add(1, Ordering::Relaxed),
            SkipReason::NotRegularFile => self.other_skipped.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Totals across every worker in a pool
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub items_received: u64,
    pub files_checksummed: u64,
    pub bytes_checksummed: u64,
    pub dirs_skipped: u64,
    pub other_skipped: u64,
    pub errors: u64,
}

/// A worker thread that checksums items
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

/// Decrements the pool's running count when a worker thread ends
struct RunningGuard(Arc<AtomicUsize>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Worker {
    /// Spawn a new worker thread
    fn spawn(
        id: usize,
        items: Receiver<WorkItem>,
        results: Sender<WorkResult>,
        stop: StopSignal,
        in_flight: InFlight,
        running: Arc<AtomicUsize>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        running.fetch_add(1, Ordering::SeqCst);
        let guard = RunningGuard(running);

        // Worker logs go to the spawning thread's subscriber and span
        let log = LogContext::capture();

        let name = format!("checksum-{}", id);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _running = guard;
                let _log = log.enter();
                worker_loop(id, items, results, stop, in_flight, stats_clone)
            })
            .map_err(|source| WorkerError::SpawnFailed { name, source })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| WorkerError::Panicked { id: self.id }),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    items: Receiver<WorkItem>,
    results: Sender<WorkResult>,
    stop: StopSignal,
    in_flight: InFlight,
    stats: Arc<WorkerStats>,
) {
    let _span = info_span!("worker", worker_id = id).entered();
    info!("Worker starting");

    loop {
        // An item that is already on offer wins over the stop signal
        let item = match items.try_recv() {
            Ok(item) => item,
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {
                let mut next = None;
                select! {
                    recv(items) -> msg => next = msg.ok(),
                    recv(stop.listener()) -> _ => {},
                }
                match next {
                    Some(item) => item,
                    // Stop fired or every sender is gone
                    None => break,
                }
            }
        };

        let _ack = Acknowledge::new(&in_flight);
        stats.record_received();
        debug!(path = %item.path.display(), size = item.meta.size, "Received work item");

        match process_item(item, &results, &stats) {
            ItemOutcome::Checksummed { path, size } => {
                debug!(path = %path.display(), size, "Item checksummed");
            }
            ItemOutcome::Skipped { path, reason } => {
                debug!(path = %path.display(), reason = %reason, "Item skipped");
            }
            ItemOutcome::Failed { error } => {
                error!(path = %error.path().display(), error = %error, "Item failed");
            }
        }
    }

    info!(
        files = stats.files_checksummed.load(Ordering::Relaxed),
        errors = stats.errors.load(Ordering::Relaxed),
        "Worker shutting down"
    );
}

/// Process a single work item
pub(crate) fn process_item(
    item: WorkItem,
    results: &Sender<WorkResult>,
    stats: &WorkerStats,
) -> ItemOutcome {
    if item.meta.is_dir || !item.meta.is_file {
        let reason = if item.meta.is_dir {
            SkipReason::Directory
        } else {
            SkipReason::NotRegularFile
        };
        stats.record_skip(reason);
        return ItemOutcome::Skipped {
            path: item.path,
            reason,
        };
    }

    let checksum = match checksum_file(&item.path) {
        Ok(digest) => digest,
        Err(error) => {
            stats.record_error();
            return ItemOutcome::Failed { error };
        }
    };

    let path = item.path.clone();
    let size = item.meta.size;

    if results.send(WorkResult { item, checksum }).is_err() {
        stats.record_error();
        return ItemOutcome::Failed {
            error: ItemError::ResultQueueClosed { path },
        };
    }

    stats.record_file(size);
    ItemOutcome::Checksummed { path, size }
}

/// Fixed-size pool of checksum workers sharing one inbound and one outbound queue
pub struct WorkerPool {
    workers: Vec<Worker>,
    stop: StopSignal,
    running: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawn `count` workers
    ///
    /// If a thread fails to spawn, the workers already started are stopped
    /// and joined before the error is returned.
    pub fn spawn(
        count: usize,
        items: Receiver<WorkItem>,
        results: Sender<WorkResult>,
        in_flight: InFlight,
    ) -> Result<Self, WorkerError> {
        let mut pool = Self {
            workers: Vec::with_capacity(count),
            stop: StopSignal::new(),
            running: Arc::new(AtomicUsize::new(0)),
        };

        for id in 0..count {
            match Worker::spawn(
                id,
                items.clone(),
                results.clone(),
                pool.stop.clone(),
                in_flight.clone(),
                Arc::clone(&pool.running),
            ) {
                Ok(worker) => pool.workers.push(worker),
                Err(e) => {
                    pool.shutdown();
                    return Err(e);
                }
            }
        }

        info!(count = pool.workers.len(), "Workers spawned");
        Ok(pool)
    }

    /// Number of worker threads that have not yet exited
    pub fn running(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.running)
    }

    /// Number of workers in the pool
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Fire the stop signal and wait for every worker to exit
    ///
    /// Idle workers exit at once; busy workers finish their current item
    /// first. Returns the final totals once every worker has been joined.
    pub fn shutdown(mut self) -> PoolStats {
        self.stop.fire();

        let workers = std::mem::take(&mut self.workers);
        let worker_stats: Vec<Arc<WorkerStats>> =
            workers.iter().map(|w| Arc::clone(&w.stats)).collect();

        for worker in workers {
            let id = worker.id();
            if let Err(e) = worker.join() {
                warn!(worker = id, error = %e, "Worker failed to join cleanly");
            }
        }

        info!("All workers completed");
        aggregate_stats(&worker_stats)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Never leave workers parked forever if the pool is dropped early
        self.stop.fire();
    }
}

/// Aggregate statistics from multiple workers
fn aggregate_stats(stats: &[Arc<WorkerStats>]) -> PoolStats {
    let mut total = PoolStats::default();
    for s in stats {
        total.items_received += s.items_received.load(Ordering::Relaxed);
        total.files_checksummed += s.files_checksummed.load(Ordering::Relaxed);
        total.bytes_checksummed += s.bytes_checksummed.load(Ordering::Relaxed);
        total.dirs_skipped += s.dirs_skipped.load(Ordering::Relaxed);
        total.other_skipped += s.other_skipped.load(Ordering::Relaxed);
        total.errors += s.errors.load(Ordering::Relaxed);
    }
    total
}
