//! Work items, results, and the hand-off queues between pipeline stages
//!
//! Both queues are rendezvous channels: a send blocks until a receiver
//! takes the value, so the producer is throttled by the slowest stage
//! without any buffering in between.
//!
//! `InFlight` is the drain barrier. The coordinator registers an item
//! before handing it off, and the worker that claims it acknowledges once
//! the item is fully processed (including delivery of its result).

use crate::content::{to_hex, Digest};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Metadata snapshot taken while walking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    /// Size in bytes
    pub size: u64,

    /// Entry is a directory
    pub is_dir: bool,

    /// Entry is a regular file
    pub is_file: bool,

    /// Unix permission bits (0 where unavailable)
    pub mode: u32,
}

impl EntryMeta {
    /// Snapshot from std metadata
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode()
        };
        #[cfg(not(unix))]
        let mode = 0;

        Self {
            size: meta.len(),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            mode,
        }
    }

    /// Metadata for a regular file of the given size
    pub fn file(size: u64) -> Self {
        Self {
            size,
            is_dir: false,
            is_file: true,
            mode: 0o644,
        }
    }

    /// Metadata for a directory
    pub fn dir() -> Self {
        Self {
            size: 0,
            is_dir: true,
            is_file: false,
            mode: 0o755,
        }
    }
}

/// One filesystem entry queued for checksumming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Path as produced by the walk
    pub path: PathBuf,

    /// Metadata snapshot
    pub meta: EntryMeta,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(path: impl Into<PathBuf>, meta: EntryMeta) -> Self {
        Self {
            path: path.into(),
            meta,
        }
    }
}

/// A work item paired with the digest of its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkResult {
    /// The item that was checksummed
    pub item: WorkItem,

    /// SHA-256 of the file contents
    pub checksum: Digest,
}

impl WorkResult {
    /// Lowercase hex form of the checksum
    pub fn checksum_hex(&self) -> String {
        to_hex(&self.checksum)
    }
}

/// Create the inbound (coordinator to workers) queue
pub fn work_queue() -> (Sender<WorkItem>, Receiver<WorkItem>) {
    bounded(0)
}

/// Create the outbound (workers to aggregator) queue
pub fn result_queue() -> (Sender<WorkResult>, Receiver<WorkResult>) {
    bounded(0)
}

struct InFlightInner {
    outstanding: Mutex<u64>,
    drained: Condvar,
}

/// Count of items handed to the pool and not yet fully processed
#[derive(Clone)]
pub struct InFlight {
    inner: Arc<InFlightInner>,
}

impl InFlight {
    /// Create an empty counter
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InFlightInner {
                outstanding: Mutex::new(0),
                drained: Condvar::new(),
            }),
        }
    }

    /// Register an item about to be handed off
    pub fn register(&self) {
        *self.inner.outstanding.lock() += 1;
    }

    /// Acknowledge that an item is done
    pub fn acknowledge(&self) {
        let mut outstanding = self.inner.outstanding.lock();
        debug_assert!(*outstanding > 0, "acknowledged an item that was never registered");
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.inner.drained.notify_all();
        }
    }

    /// Current outstanding count
    pub fn outstanding(&self) -> u64 {
        *self.inner.outstanding.lock()
    }

    /// Block until nothing is outstanding or the timeout elapses
    ///
    /// Returns true once drained.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let mut outstanding = self.inner.outstanding.lock();
        if *outstanding == 0 {
            return true;
        }
        self.inner.drained.wait_for(&mut outstanding, timeout);
        *outstanding == 0
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard acknowledging one item when dropped
///
/// Held by a worker for the whole time it processes an item, so a panic
/// inside processing still releases the drain barrier.
pub struct Acknowledge<'a> {
    in_flight: &'a InFlight,
}

impl<'a> Acknowledge<'a> {
    /// Start holding an acknowledgement for one item
    pub fn new(in_flight: &'a InFlight) -> Self {
        Self { in_flight }
    }
}

impl<'a> Drop for Acknowledge<'a> {
    fn drop(&mut self) {
        self.in_flight.acknowledge();
    }
}
