//! checksum-walker - Parallel Filesystem Checksummer
//!
//! Walks a directory tree, computes a SHA-256 digest for every regular file
//! and writes the results to a pluggable sink (JSON lines by default).
//!
//! # Features
//!
//! - **Bounded Worker Pool**: a fixed number of worker threads share one
//!   rendezvous queue, so the walk is throttled by checksum throughput and
//!   memory use stays flat on huge trees.
//!
//! - **Single Writer**: one aggregator thread owns the sink, so sinks need
//!   no internal locking.
//!
//! - **Ordered Shutdown**: production is followed by a drain barrier, then
//!   the pool is stopped and joined, then the aggregator. No result is
//!   abandoned in a queue.
//!
//! - **Item-local Errors**: unreadable files are logged and skipped; the run
//!   continues.
//!
//! # Example
//!
//! ```bash
//! # Checksum a tree into output_results.jsonl
//! checksum-walker /data
//!
//! # Fewer workers, custom output, skip VCS metadata
//! checksum-walker /data -w 8 -o sums.jsonl --exclude '/\.git(/|$)'
//! ```
//!
//! Each output line looks like:
//!
//! ```text
//! {"Path":"/data/empty.txt","Checksum":"e3b0c442...7852b855","SizeBytes":0}
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod progress;
pub mod sink;
pub mod walker;

pub use config::{CliArgs, SinkKind, WalkConfig};
pub use error::{Result, WalkerError};
pub use sink::{JsonLineSink, LogSink, ResultSink};
pub use walker::{WalkCoordinator, WalkResult};
