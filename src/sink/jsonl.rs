//! JSON-lines result sink
//!
//! Writes one object per result:
//!
//! ```text
//! {"Path":"/data/a.txt","Checksum":"e3b0...b855","SizeBytes":0}
//! ```

use crate::error::{SinkError, SinkResult};
use crate::sink::ResultSink;
use crate::walker::WorkResult;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// On-disk form of one result
///
/// `Path` is a JSON string, so a path that is not valid UTF-8 is written
/// with U+FFFD in place of the invalid bytes and a warning is logged. Two
/// such paths can map to the same `Path` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonLine {
    #[serde(rename = "Path")]
    pub path: String,

    #[serde(rename = "Checksum")]
    pub checksum: String,

    #[serde(rename = "SizeBytes")]
    pub size_bytes: u64,
}

impl From<&WorkResult> for JsonLine {
    fn from(result: &WorkResult) -> Self {
        Self {
            path: result.item.path.to_string_lossy().into_owned(),
            checksum: result.checksum_hex(),
            size_bytes: result.item.meta.size,
        }
    }
}

/// Sink appending JSON lines to a file
pub struct JsonLineSink {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    lines_written: u64,
}

impl JsonLineSink {
    /// Create (or truncate) the output file
    pub fn create(path: &Path) -> SinkResult<Self> {
        let file = File::create(path).map_err(|source| SinkError::CreateFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_file(file, path))
    }

    /// Open the output file for appending, creating it if needed
    pub fn append(path: &Path) -> SinkResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::CreateFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_file(file, path))
    }

    fn from_file(file: File, path: &Path) -> Self {
        Self {
            writer: Some(BufWriter::new(file)),
            path: path.to_path_buf(),
            lines_written: 0,
        }
    }

}

impl ResultSink for JsonLineSink {
    fn persist(&mut self, result: &WorkResult) -> SinkResult<()> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;

        if result.item.path.to_str().is_none() {
            warn!(
                path = %result.item.path.display(),
                "Path is not valid UTF-8, writing it lossily"
            );
        }

        // Encode the whole line first so a failure never leaves half a line
        let mut line = serde_json::to_vec(&JsonLine::from(result))?;
        line.push(b'\n');
        writer.write_all(&line)?;

        self.lines_written += 1;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        match self.writer.take() {
            Some(mut writer) => {
                writer.flush()?;
                writer.get_ref().sync_all()?;
                info!(
                    output = %self.path.display(),
                    lines = self.lines_written,
                    "Result file closed"
                );
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for JsonLineSink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::{EntryMeta, WorkItem};
    use tempfile::tempdir;

    fn result(path: &str, size: u64, byte: u8) -> WorkResult {
        WorkResult {
            item: WorkItem::new(path, EntryMeta::file(size)),
            checksum: [byte; 32],
        }
    }

    #[test]
    fn test_line_format() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.jsonl");

        let mut sink = JsonLineSink::create(&out).unwrap();
        sink.persist(&result("/data/a.txt", 42, 0x01)).unwrap();
        sink.close().unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            content,
            format!(
                "{{\"Path\":\"/data/a.txt\",\"Checksum\":\"{}\",\"SizeBytes\":42}}\n",
                "01".repeat(32)
            )
        );
    }

    #[test]
    fn test_lines_parse_back() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.jsonl");

        let mut sink = JsonLineSink::create(&out).unwrap();
        sink.persist(&result("/a", 1, 0xaa)).unwrap();
        sink.persist(&result("/b", 2, 0xbb)).unwrap();
        assert_eq!(sink.lines_written, 2);
        sink.close().unwrap();

        let lines: Vec<JsonLine> = std::fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].path, "/b");
        assert_eq!(lines[1].size_bytes, 2);
        assert_eq!(lines[1].checksum, "bb".repeat(32));
    }

    #[test]
    fn test_create_truncates_and_append_appends() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.jsonl");

        for _ in 0..2 {
            let mut sink = JsonLineSink::create(&out).unwrap();
            sink.persist(&result("/a", 1, 0)).unwrap();
            sink.close().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&out).unwrap().lines().count(), 1);

        let mut sink = JsonLineSink::append(&out).unwrap();
        sink.persist(&result("/b", 1, 0)).unwrap();
        sink.close().unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_persist_after_close() {
        let dir = tempdir().unwrap();
        let mut sink = JsonLineSink::create(&dir.path().join("out.jsonl")).unwrap();
        sink.close().unwrap();

        let err = sink.persist(&result("/a", 1, 0)).unwrap_err();
        assert!(matches!(err, SinkError::Closed));

        // Closing twice is fine
        sink.close().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_written_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let out = dir.path().join("out.jsonl");
        let raw = Path::new(OsStr::from_bytes(b"/data/caf\xe9.txt"));

        let mut sink = JsonLineSink::create(&out).unwrap();
        let result = WorkResult {
            item: WorkItem::new(raw, EntryMeta::file(3)),
            checksum: [0x11; 32],
        };
        sink.persist(&result).unwrap();
        sink.close().unwrap();

        let line: JsonLine =
            serde_json::from_str(std::fs::read_to_string(&out).unwrap().trim_end()).unwrap();
        assert_eq!(line.path, "/data/caf\u{FFFD}.txt");
        assert_eq!(line.size_bytes, 3);
    }

    #[test]
    fn test_create_failure() {
        let dir = tempdir().unwrap();
        let err = JsonLineSink::create(&dir.path().join("missing").join("out.jsonl")).err();
        assert!(matches!(err, Some(SinkError::CreateFailed { .. })));
    }
}
