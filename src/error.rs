//! Error types for checksum-walker
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI errors
//! - Result sink errors (output file creation, encoding, writing)
//! - Worker pool and aggregator thread errors
//! - Item-local checksum errors, which are logged and never propagated
//!
//! Library code uses thiserror; the binary wraps everything in anyhow.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the checksum-walker application
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Result sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// The walk of the root path failed
    #[error("Failed to walk '{}': {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid reporting interval
    #[error("Invalid report interval: must be at least one second")]
    InvalidReportInterval,

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Output path error
    #[error("Invalid output path '{}': {reason}", .path.display())]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// Result sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// Backing file could not be created
    #[error("Failed to create output file '{}': {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single result could not be encoded
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing or flushing failed
    #[error("Failed to write result: {0}")]
    Write(#[from] io::Error),

    /// Sink was used after close
    #[error("Sink is already closed")]
    Closed,
}

/// Worker pool and aggregator thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// Aggregator thread panicked
    #[error("Result aggregator panicked")]
    AggregatorPanicked,

    /// Thread could not be spawned
    #[error("Failed to spawn thread '{name}': {source}")]
    SpawnFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Every worker exited while work was still being produced
    #[error("All workers have terminated unexpectedly")]
    AllWorkersDead,
}

/// Errors local to a single work item
///
/// These never abort the pipeline; the worker that hits one logs it and
/// drops the item.
#[derive(Error, Debug)]
pub enum ItemError {
    /// File could not be opened
    #[error("Failed to open '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File could not be read to the end
    #[error("Failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Nobody is draining the result queue anymore
    #[error("Result queue closed before '{}' could be delivered", .path.display())]
    ResultQueueClosed { path: PathBuf },
}

impl ItemError {
    /// Path of the item that failed
    pub fn path(&self) -> &std::path::Path {
        match self {
            ItemError::Open { path, .. } => path,
            ItemError::Read { path, .. } => path,
            ItemError::ResultQueueClosed { path } => path,
        }
    }
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Result type alias for SinkError
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Represents the outcome of processing a single work item
#[derive(Debug)]
pub enum ItemOutcome {
    /// Digest computed and handed to the aggregator
    Checksummed { path: PathBuf, size: u64 },

    /// Entry intentionally not checksummed
    Skipped { path: PathBuf, reason: SkipReason },

    /// Item dropped after an item-local error
    Failed { error: ItemError },
}

/// Why an entry produced no result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Directories carry no content to checksum
    Directory,
    /// Symlinks, FIFOs, sockets and devices
    NotRegularFile,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Directory => f.write_str("directory"),
            SkipReason::NotRegularFile => f.write_str("not a regular file"),
        }
    }
}
