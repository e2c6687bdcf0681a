//! Command implementation for the CSV loader CLI
//!
//! Contains the main execution logic: logging setup, configuration
//! resolution, client connection, progress reporting, and the final
//! operator summary.

use crate::app::adapters::client::{MemoryClient, MemoryStore};
use crate::app::models::Summary;
use crate::app::services::loader::CsvLoader;
use crate::app::services::report::ReportWriter;
use crate::cli::args::Args;
use crate::constants::ACKNOWLEDGED_TUPLES_PREFIX;
use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Run one loading run end to end.
///
/// Returns the finalized summary; the caller maps it to a process exit
/// status. Setup failures surface as errors before any row is processed.
pub async fn run(args: Args) -> Result<Summary> {
    setup_logging(&args)?;

    info!("Starting CSV loader");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = args.to_config();
    config.validate()?;

    // The bundled backend; a driver for a real store plugs in through the
    // same trait
    let store = Arc::new(MemoryStore::new(args.schema())?);
    let client = Arc::new(MemoryClient::connect(store));
    info!("Connected to in-memory store for table '{}'", config.table);

    let progress_bar = if args.show_progress() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.set_message(format!("Loading {}", config.input_path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let loader = CsvLoader::new(config.clone(), client);
    let result = loader.run().await;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }
    let summary = result?;

    let report_path = ReportWriter::new(&config.report_dir).write(&summary)?;
    print_summary(&summary, &report_path.display().to_string());

    Ok(summary)
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("csvloader={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Print the operator-facing run summary to stdout
fn print_summary(summary: &Summary, report_path: &str) {
    println!();
    println!("Load of '{}' into '{}' complete", summary.input_path, summary.table);
    println!("  Lines read:              {}", summary.lines_read);
    if summary.blank_lines_skipped > 0 {
        println!("  Blank lines skipped:     {}", summary.blank_lines_skipped);
    }
    println!("  {} {}", ACKNOWLEDGED_TUPLES_PREFIX, summary.tuples_acknowledged);
    println!("  Rows rejected:           {}", summary.rows_rejected);
    println!("  Tuples failed:           {}", summary.tuples_failed);
    if summary.aborted {
        println!(
            "  ABORTED EARLY after crossing the failure threshold; {} rows were not attempted",
            summary.rows_truncated
        );
    }
    println!("  Elapsed:                 {:.3}s", summary.duration.as_secs_f64());
    println!("  Report:                  {}", report_path);
}
