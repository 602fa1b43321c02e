//! Parallel checksum pipeline
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │     WalkCoordinator     │
//!                     │  - walkdir traversal    │
//!                     │  - drain barrier        │
//!                     └───────────┬─────────────┘
//!                                 │ WorkItem (rendezvous)
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │  SHA-256  │             │  SHA-256  │             │  SHA-256  │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       └─────────────────────────┼─────────────────────────┘
//!                                 │ WorkResult (rendezvous)
//!                     ┌───────────▼─────────────┐
//!                     │    ResultAggregator     │──── reporter (every N s)
//!                     │  - single sink writer   │
//!                     └───────────┬─────────────┘
//!                                 ▼
//!                             ResultSink
//! ```
//!
//! Shutdown runs in two phases: the pool's stop signal fires only after
//! production has ended and every item has been acknowledged, and the
//! aggregator's stop signal fires only after every worker has been joined.

pub mod aggregator;
pub mod coordinator;
mod log_context;
pub mod queue;
pub mod signal;
pub mod throughput;
pub mod worker;

pub use aggregator::{AggregatorSummary, ResultAggregator};
pub use coordinator::{WalkCoordinator, WalkResult};
pub use queue::{result_queue, work_queue, EntryMeta, InFlight, WorkItem, WorkResult};
pub use signal::StopSignal;
pub use throughput::ThroughputCounter;
pub use worker::{PoolStats, WorkerPool};
