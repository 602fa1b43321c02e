//! Result sinks
//!
//! A sink persists checksum results. The aggregator is its only caller, so
//! implementations need not be thread-safe beyond being `Send`.

pub mod jsonl;
pub mod log;

pub use jsonl::{JsonLine, JsonLineSink};
pub use log::LogSink;

use crate::config::{SinkKind, WalkConfig};
use crate::error::SinkResult;
use crate::walker::WorkResult;

/// Persistence target for work results
pub trait ResultSink: Send {
    /// Persist one result
    fn persist(&mut self, result: &WorkResult) -> SinkResult<()>;

    /// Flush and release underlying resources
    fn close(&mut self) -> SinkResult<()>;
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn persist(&mut self, result: &WorkResult) -> SinkResult<()> {
        (**self).persist(result)
    }

    fn close(&mut self) -> SinkResult<()> {
        (**self).close()
    }
}

/// Build the sink selected by the configuration
///
/// Failing to create the backing file is fatal for the caller.
pub fn open_sink(config: &WalkConfig) -> SinkResult<Box<dyn ResultSink>> {
    match config.sink {
        SinkKind::Jsonl => {
            let sink = if config.append {
                JsonLineSink::append(&config.output_path)?
            } else {
                JsonLineSink::create(&config.output_path)?
            };
            Ok(Box::new(sink))
        }
        SinkKind::Log => Ok(Box::new(LogSink::new())),
    }
}
