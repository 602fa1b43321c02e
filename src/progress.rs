//! Terminal progress display and summary output
//!
//! The spinner reads the aggregator's throughput counter from a small
//! background thread; it has no effect on the pipeline itself.

use crate::walker::{ThroughputCounter, WalkResult};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often the spinner message is refreshed
const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Snapshot shown on the spinner
#[derive(Debug, Clone, Default)]
pub struct WalkProgress {
    /// Results persisted so far
    pub processed: u64,

    /// Results persisted in the last second
    pub rate: u64,

    /// Time since the walk started
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Average files per second since start
    pub fn average_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Progress reporter that displays walk status
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,

    /// Stop signal for the refresh thread
    stop: Arc<AtomicBool>,

    /// Refresh thread, if tracking
    refresher: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        let spinner = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(spinner);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            stop: Arc::new(AtomicBool::new(false)),
            refresher: None,
        }
    }

    /// Keep the spinner message in sync with a throughput counter
    pub fn track(&mut self, throughput: Arc<ThroughputCounter>) {
        let bar = self.bar.clone();
        let stop = Arc::clone(&self.stop);
        let start = Instant::now();

        let refresher = thread::Builder::new()
            .name("progress".into())
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let progress = WalkProgress {
                        processed: throughput.processed(),
                        rate: throughput.rate(),
                        elapsed: start.elapsed(),
                    };
                    bar.set_message(progress_message(&progress));
                    thread::sleep(REFRESH_INTERVAL);
                }
            });

        // The spinner is cosmetic; without the thread it just keeps spinning
        self.refresher = refresher.ok();
    }

    /// Finish the progress display with a final message
    pub fn finish(&mut self, message: &str) {
        self.stop_refresher();
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&mut self) {
        self.stop_refresher();
        self.bar.finish_and_clear();
    }

    fn stop_refresher(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(refresher) = self.refresher.take() {
            let _ = refresher.join();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop_refresher();
    }
}

fn progress_message(progress: &WalkProgress) -> String {
    format!(
        "Files: {} | Rate: {}/s | Avg: {:.0}/s",
        format_number(progress.processed),
        format_number(progress.rate),
        progress.average_rate(),
    )
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Print a summary of the walk results
pub fn print_summary(result: &WalkResult, output: Option<&str>) {
    let duration_secs = result.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        result.files_checksummed as f64 / duration_secs
    } else {
        0.0
    };

    let title = if result.completed {
        style("Checksum Walk Complete").green().bold()
    } else {
        style("Checksum Walk Interrupted").yellow().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Entries:").bold(), format_number(result.entries_walked));
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(result.files_checksummed)
    );
    println!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(result.dirs_skipped)
    );
    println!(
        "  {} {}",
        style("Checksummed:").bold(),
        format_size(result.bytes_checksummed, BINARY)
    );
    println!(
        "  {} {}",
        style("Persisted:").bold(),
        format_number(result.results_persisted)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if result.errors() > 0 {
        println!(
            "  {} {} (items: {}, walk: {}, sink: {})",
            style("Errors:").yellow().bold(),
            format_number(result.errors()),
            result.item_errors,
            result.walk_errors,
            result.sink_errors
        );
    }
    if let Some(output) = output {
        println!("  {} {}", style("Output:").bold(), output);
    }
    println!();
}

/// Print a header at the start of the walk
pub fn print_header(root: &str, workers: usize, output: &str) {
    println!();
    println!(
        "{} {}",
        style("checksum-walker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_average_rate() {
        let progress = WalkProgress {
            processed: 10_000,
            rate: 900,
            elapsed: Duration::from_secs(10),
        };
        assert!((progress.average_rate() - 1000.0).abs() < 0.1);
        assert_eq!(WalkProgress::default().average_rate(), 0.0);
    }
}
