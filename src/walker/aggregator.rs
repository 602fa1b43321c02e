//! Result aggregator
//!
//! A single thread drains the outbound queue and hands every result to the
//! sink, so the sink only ever sees one writer. A second thread logs the
//! throughput counter on a fixed interval.
//!
//! The aggregator must be stopped only after the worker pool has been
//! joined; otherwise a worker could block forever on a result nobody takes.

use crate::error::{SinkResult, WorkerError};
use crate::sink::ResultSink;
use crate::walker::log_context::LogContext;
use crate::walker::queue::WorkResult;
use crate::walker::signal::StopSignal;
use crate::walker::throughput::ThroughputCounter;
use crossbeam_channel::{select, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};

/// Final numbers reported by the aggregator
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSummary {
    /// Results successfully persisted
    pub persisted: u64,

    /// Results the sink rejected
    pub sink_errors: u64,
}

/// Handle to the running aggregator and reporter threads
pub struct ResultAggregator {
    handle: Option<JoinHandle<(AggregatorSummary, SinkResult<()>)>>,
    reporter: Option<JoinHandle<()>>,
    stop: StopSignal,
    throughput: Arc<ThroughputCounter>,
}

impl ResultAggregator {
    /// Spawn the aggregator and its reporter
    pub fn spawn(
        results: Receiver<WorkResult>,
        sink: Box<dyn ResultSink>,
        throughput: Arc<ThroughputCounter>,
        report_interval: Duration,
    ) -> Result<Self, WorkerError> {
        let stop = StopSignal::new();
        let log = LogContext::capture();

        let handle = {
            let stop = stop.clone();
            let throughput = Arc::clone(&throughput);
            thread::Builder::new()
                .name("aggregator".into())
                .spawn({
                    let log = log.clone();
                    move || {
                        let _log = log.enter();
                        aggregator_loop(results, sink, stop, throughput)
                    }
                })
                .map_err(|source| WorkerError::SpawnFailed {
                    name: "aggregator".into(),
                    source,
                })?
        };

        let reporter = {
            let stop = stop.clone();
            let throughput = Arc::clone(&throughput);
            thread::Builder::new()
                .name("reporter".into())
                .spawn(move || {
                    let _log = log.enter();
                    reporter_loop(stop, throughput, report_interval)
                })
        };

        let reporter = match reporter {
            Ok(reporter) => reporter,
            Err(source) => {
                stop.fire();
                let _ = handle.join();
                return Err(WorkerError::SpawnFailed {
                    name: "reporter".into(),
                    source,
                });
            }
        };

        Ok(Self {
            handle: Some(handle),
            reporter: Some(reporter),
            stop,
            throughput,
        })
    }

    /// Shared throughput counter
    pub fn throughput(&self) -> Arc<ThroughputCounter> {
        Arc::clone(&self.throughput)
    }

    /// Stop the aggregator, close the sink, and join both threads
    ///
    /// A failure to close the sink is returned alongside the summary so the
    /// caller can decide whether it is fatal.
    pub fn shutdown(mut self) -> Result<(AggregatorSummary, SinkResult<()>), WorkerError> {
        self.stop.fire();

        let outcome = match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::AggregatorPanicked)?,
            None => (AggregatorSummary::default(), Ok(())),
        };

        if let Some(reporter) = self.reporter.take() {
            if reporter.join().is_err() {
                warn!("Reporter thread panicked");
            }
        }

        info!("Result aggregator finished");
        Ok(outcome)
    }
}

impl Drop for ResultAggregator {
    fn drop(&mut self) {
        self.stop.fire();
    }
}

/// Main aggregator loop
fn aggregator_loop(
    results: Receiver<WorkResult>,
    mut sink: Box<dyn ResultSink>,
    stop: StopSignal,
    throughput: Arc<ThroughputCounter>,
) -> (AggregatorSummary, SinkResult<()>) {
    let _span = info_span!("aggregator").entered();
    info!("Starting result aggregator");

    let mut summary = AggregatorSummary::default();

    loop {
        select! {
            recv(results) -> msg => match msg {
                Ok(result) => handle_result(&mut *sink, &result, &throughput, &mut summary),
                // Every worker is gone
                Err(_) => break,
            },
            recv(stop.listener()) -> _ => break,
        }
    }

    let closed = sink.close();
    if let Err(e) = &closed {
        error!(error = %e, "Failed to close sink");
    }

    info!(
        persisted = summary.persisted,
        sink_errors = summary.sink_errors,
        "Result aggregator stopping"
    );
    (summary, closed)
}

fn handle_result(
    sink: &mut dyn ResultSink,
    result: &WorkResult,
    throughput: &ThroughputCounter,
    summary: &mut AggregatorSummary,
) {
    debug!(path = %result.item.path.display(), "Received work result");

    match sink.persist(result) {
        Ok(()) => {
            summary.persisted += 1;
            throughput.record();
        }
        Err(e) => {
            summary.sink_errors += 1;
            error!(path = %result.item.path.display(), error = %e, "Failed to persist result");
        }
    }
}

/// Periodic statistics logger
fn reporter_loop(stop: StopSignal, throughput: Arc<ThroughputCounter>, interval: Duration) {
    let _span = info_span!("reporter").entered();

    loop {
        info!(
            files_processed = throughput.processed(),
            files_per_second = throughput.rate(),
            "Statistics"
        );
        if stop.wait_timeout(interval) {
            break;
        }
    }

    info!(
        files_processed = throughput.processed(),
        "Final statistics"
    );
    debug!("Reporter thread ending");
}
