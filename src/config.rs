//! Configuration types for checksum-walker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Default number of checksum workers
pub const DEFAULT_WORKERS: usize = 32;

/// Default statistics reporting interval
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Default output file for the JSON-lines sink
pub const DEFAULT_OUTPUT: &str = "output_results.jsonl";

/// Walk a directory tree and write a SHA-256 checksum for every regular file
#[derive(Parser, Debug, Clone)]
#[command(
    name = "checksum-walker",
    version,
    about = "Walk a directory tree and checksum every regular file",
    long_about = "Walks a directory tree, computes a SHA-256 digest for every regular file \
                  using a pool of worker threads, and writes one JSON object per file to a \
                  JSON-lines output file.",
    after_help = "EXAMPLES:\n    \
        checksum-walker /data\n    \
        checksum-walker /data -o sums.jsonl -w 8\n    \
        checksum-walker /srv --exclude '\\.git/' --max-depth 4\n    \
        checksum-walker /srv --sink log -v"
)]
pub struct CliArgs {
    /// Root path to walk
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Output JSON-lines file
    #[arg(short, long, default_value = DEFAULT_OUTPUT, value_name = "FILE")]
    pub output: PathBuf,

    /// Where checksum results are written
    #[arg(long, value_enum, default_value_t = SinkKind::Jsonl)]
    pub sink: SinkKind,

    /// Append to the output file instead of truncating it
    #[arg(long)]
    pub append: bool,

    /// Number of checksum worker threads
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS, value_name = "NUM")]
    pub workers: usize,

    /// Seconds between throughput statistics log lines
    #[arg(long, default_value_t = DEFAULT_REPORT_INTERVAL.as_secs(), value_name = "SECS")]
    pub report_interval: u64,

    /// Maximum directory depth (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_links: bool,

    /// Exclude paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-item debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Result sink variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// One JSON object per line in the output file
    Jsonl,
    /// Log every result instead of writing a file
    Log,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Root of the walk
    pub root: PathBuf,

    /// Output file path
    pub output_path: PathBuf,

    /// Selected sink
    pub sink: SinkKind,

    /// Append instead of truncate
    pub append: bool,

    /// Number of worker threads
    pub worker_count: usize,

    /// Interval between statistics reports
    pub report_interval: Duration,

    /// Maximum traversal depth
    pub max_depth: Option<usize>,

    /// Follow symlinks during the walk
    pub follow_links: bool,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl WalkConfig {
    /// Configuration with every default for the given root
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            sink: SinkKind::Jsonl,
            append: false,
            worker_count: DEFAULT_WORKERS,
            report_interval: DEFAULT_REPORT_INTERVAL,
            max_depth: None,
            follow_links: false,
            exclude_patterns: Vec::new(),
            show_progress: false,
            verbose: false,
        }
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Validate worker count
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.report_interval == 0 {
            return Err(ConfigError::InvalidReportInterval);
        }

        // Compile exclude patterns
        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Validate output path
        if args.sink == SinkKind::Jsonl {
            if let Some(parent) = args.output.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(ConfigError::InvalidOutputPath {
                        path: args.output.clone(),
                        reason: format!("Parent directory '{}' does not exist", parent.display()),
                    });
                }
            }
        }

        Ok(Self {
            root: args.root,
            output_path: args.output,
            sink: args.sink,
            append: args.append,
            worker_count: args.workers,
            report_interval: Duration::from_secs(args.report_interval),
            max_depth: args.max_depth,
            follow_links: args.follow_links,
            exclude_patterns,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("checksum-walker").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = WalkConfig::from_args(parse(&["/data"])).unwrap();
        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.output_path, PathBuf::from("output_results.jsonl"));
        assert_eq!(config.worker_count, 32);
        assert_eq!(config.report_interval, Duration::from_secs(10));
        assert_eq!(config.sink, SinkKind::Jsonl);
        assert!(config.show_progress);
        assert!(!config.append);
    }

    #[test]
    fn test_root_is_required() {
        assert!(CliArgs::try_parse_from(["checksum-walker"]).is_err());
    }

    #[test]
    fn test_invalid_worker_count() {
        let err = WalkConfig::from_args(parse(&["/data", "-w", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount { count: 0, .. }));

        let err = WalkConfig::from_args(parse(&["/data", "-w", "10000"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount { count: 10000, .. }));
    }

    #[test]
    fn test_invalid_report_interval() {
        let err = WalkConfig::from_args(parse(&["/data", "--report-interval", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidReportInterval));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let err = WalkConfig::from_args(parse(&["/data", "--exclude", "("])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExcludePattern { .. }));
    }

    #[test]
    fn test_missing_output_parent() {
        let err = WalkConfig::from_args(parse(&["/data", "-o", "/no/such/dir/out.jsonl"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOutputPath { .. }));

        // The log sink never touches the output path
        let config =
            WalkConfig::from_args(parse(&["/data", "-o", "/no/such/dir/out.jsonl", "--sink", "log"]))
                .unwrap();
        assert_eq!(config.sink, SinkKind::Log);
    }

    #[test]
    fn test_exclude_pattern() {
        let config = WalkConfig::from_args(parse(&["/data", "--exclude", r"\.snapshot"])).unwrap();

        assert!(config.is_excluded(Path::new("/data/.snapshot/hourly.0")));
        assert!(!config.is_excluded(Path::new("/data/myfile.txt")));
    }
}
