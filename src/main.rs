//! checksum-walker - Parallel Filesystem Checksummer
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use checksum_walker::config::{CliArgs, SinkKind, WalkConfig};
use checksum_walker::progress::{print_header, print_summary, ProgressReporter};
use checksum_walker::sink::open_sink;
use checksum_walker::walker::WalkCoordinator;
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose);

    // Validate and create config
    let config = WalkConfig::from_args(args).context("Invalid configuration")?;

    let output = match config.sink {
        SinkKind::Jsonl => Some(config.output_path.display().to_string()),
        SinkKind::Log => None,
    };

    if config.show_progress {
        print_header(
            &config.root.display().to_string(),
            config.worker_count,
            output.as_deref().unwrap_or("log"),
        );
    }

    // Failing to create the output is fatal before any work starts
    let sink = open_sink(&config).context("Failed to open result sink")?;

    let show_progress = config.show_progress;
    let coordinator = WalkCoordinator::new(config, sink);

    // Setup signal handler for graceful shutdown
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing in-flight work...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let mut progress = show_progress.then(ProgressReporter::new);
    if let Some(p) = progress.as_mut() {
        p.track(coordinator.throughput());
    }

    let result = coordinator.run();

    if let Some(p) = progress.as_mut() {
        match &result {
            Ok(r) if r.completed => p.finish("Walk completed"),
            Ok(_) => p.finish("Walk interrupted"),
            Err(_) => p.finish_and_clear(),
        }
    }

    let result = result.context("Walk failed")?;

    if show_progress {
        print_summary(&result, output.as_deref());
    }

    if !result.completed {
        info!("Walk was interrupted before completion");
    }

    if result.errors() > 0 {
        info!(errors = result.errors(), "Walk completed with errors");
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "checksum_walker=debug,warn"
    } else {
        "checksum_walker=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
