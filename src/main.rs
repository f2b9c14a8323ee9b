//! tagfix - audio tag encoding normalizer
//!
//! Walks a music folder and rewrites the tags of every supported audio file
//! through a format-aware tag codec, which leaves them in a consistent
//! encoding and, for MP3, a single ID3v2 version.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use tagfix::cli::Args;
use tagfix::config::Config;
use tagfix::engine::{Engine, Interrupt};
use tagfix::error::TagFixError;
use tagfix::format::{Category, FormatRegistry};
use tagfix::preview::DryRun;
use tagfix::report::{self, Reporter, TracingReporter};
use tagfix::scan;

const SEPARATOR_WIDTH: usize = 60;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => Config::default(),
    };
    args.apply(&mut config);

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let root = args.path.clone().context("a folder path is required")?;
    let log_file = args.log_file(&config, chrono::Local::now());

    // Keep the guard alive until main returns so the log file is flushed
    let _guard = setup_logging(args.verbose, log_file.as_deref())?;

    if !root_is_usable(&root) {
        return Ok(ExitCode::FAILURE);
    }

    let version = config.tags.id3_version;
    info!("Processing folder: {}", root.display());
    info!("Tag version: {}", version);
    if let Some(path) = &log_file {
        info!("Log file: {}", path.display());
    }
    log_supported_formats(&FormatRegistry::new());
    info!("{}", "=".repeat(SEPARATOR_WIDTH));

    let interrupt = Interrupt::new();
    listen_for_interrupt(interrupt.clone());

    let reporter = TracingReporter::new(!args.verbose, args.verbose);
    let result = if args.test {
        run_preview(root, interrupt, reporter, args.verbose).await
    } else {
        run_normalize(root, Engine::new(version, interrupt), reporter, args.verbose).await
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(TagFixError::Interrupted) => {
            warn!("Interrupted by user");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_preview(
    root: std::path::PathBuf,
    interrupt: Interrupt,
    mut reporter: TracingReporter,
    verbose: bool,
) -> tagfix::error::Result<()> {
    announce(verbose, "TEST MODE. Files will not be modified.");
    info!("The following files would be processed:");
    info!("{}", "=".repeat(SEPARATOR_WIDTH));

    let outcome = tokio::task::spawn_blocking(move || {
        let result = DryRun::new(interrupt)
            .collect_paths(verbose)
            .run(&root, &mut reporter);
        reporter.finish();
        result
    })
    .await
    .map_err(|e| TagFixError::Io(std::io::Error::other(e)))??;

    info!("{}", "=".repeat(SEPARATOR_WIDTH));
    announce(verbose, &format!("Files found for processing: {}", outcome.files));
    announce(verbose, &format!("Total size: {}", outcome.total_size()));
    Ok(())
}

async fn run_normalize(
    root: std::path::PathBuf,
    engine: Engine,
    mut reporter: TracingReporter,
    verbose: bool,
) -> tagfix::error::Result<()> {
    let started = Instant::now();

    let outcome = tokio::task::spawn_blocking(move || {
        let result = engine.run(&root, &mut reporter);
        reporter.finish();
        result
    })
    .await
    .map_err(|e| TagFixError::Io(std::io::Error::other(e)))??;

    let elapsed = started.elapsed();
    info!("{}", "=".repeat(SEPARATOR_WIDTH));
    announce(verbose, "PROCESSING COMPLETE");
    announce(verbose, &format!("Successfully processed: {} files", outcome.processed));
    if outcome.untagged > 0 {
        announce(verbose, &format!("  of which without tags (left unchanged): {}", outcome.untagged));
    }
    announce(verbose, &format!("Errors: {}", outcome.errors));
    announce(verbose, &format!("Elapsed time: {}", report::format_duration(elapsed)));

    if outcome.errors == 0 {
        info!("All files processed successfully!");
    } else {
        warn!("There were {} errors during processing", outcome.errors);
    }
    Ok(())
}

/// Check the root before anything is touched; the failure is logged once here
fn root_is_usable(root: &Path) -> bool {
    match scan::check_root(root) {
        Ok(()) => true,
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

/// Log a summary line; echo it to stdout when the console only shows warnings
fn announce(verbose: bool, line: &str) {
    info!("{}", line);
    if !verbose {
        println!("{}", line);
    }
}

fn log_supported_formats(registry: &FormatRegistry) {
    info!("Supported formats:");
    for category in Category::ALL {
        info!("  {}: {}", category.label(), registry.extensions_in(category).join(", "));
    }
}

/// Stop the traversal after the current file on Ctrl+C
fn listen_for_interrupt(interrupt: Interrupt) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received Ctrl+C, stopping after the current file");
                interrupt.trigger();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });
}

/// Setup logging to the console and, optionally, to a file
fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let console_level = if verbose { LevelFilter::INFO } else { LevelFilter::WARN };

    // Console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::from_default_env().add_directive(console_level.into()));

    // File layer, always at debug
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let log_dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(log_dir)
                .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;

            let (writer, guard) = non_blocking(rolling::never(log_dir, file_name));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}
