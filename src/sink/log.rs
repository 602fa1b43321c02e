//! Sink that writes every result to the log instead of a file

use crate::error::SinkResult;
use crate::sink::ResultSink;
use crate::walker::WorkResult;
use tracing::info;

/// Logs each result at info level
#[derive(Debug, Default)]
pub struct LogSink {
    logged: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of results logged
    pub fn logged(&self) -> u64 {
        self.logged
    }
}

impl ResultSink for LogSink {
    fn persist(&mut self, result: &WorkResult) -> SinkResult<()> {
        info!(
            path = %result.item.path.display(),
            checksum = %result.checksum_hex(),
            size = result.item.meta.size,
            "Received work result"
        );
        self.logged += 1;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        info!(logged = self.logged, "Log sink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::{EntryMeta, WorkItem};

    #[test]
    fn test_log_sink_counts() {
        let mut sink = LogSink::new();
        let result = WorkResult {
            item: WorkItem::new("/a", EntryMeta::file(3)),
            checksum: [0; 32],
        };
        sink.persist(&result).unwrap();
        sink.persist(&result).unwrap();
        sink.close().unwrap();
        assert_eq!(sink.logged(), 2);
    }
}
