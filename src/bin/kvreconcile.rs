//! kvreconcile binary
//!
//! Copies keys missing from each destination sub-store out of the matching
//! source sub-store.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use kvreconcile::{Config, DirectoriesHandler, DiskStoreHandle, ReconcileReport, Reconciler};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Copy missing keys between two collections of key-value stores
#[derive(Parser, Debug)]
#[command(name = "kvreconcile")]
#[command(about = "Copies keys missing from destination stores out of same-named source stores")]
#[command(version)]
struct Args {
    /// The source directory to read data from
    #[arg(long, default_value = "source")]
    source: PathBuf,

    /// The destination directory to write the missing data to
    #[arg(long, default_value = "destination")]
    destination: PathBuf,

    /// Log filter directives, e.g. "info" or "info,kvreconcile::engine=debug".
    /// Falls back to RUST_LOG, then "info".
    #[arg(long)]
    log_level: Option<String>,

    /// Also write all logs to a file under ./logs
    #[arg(long)]
    log_save: bool,

    /// MemTable size limit in MB before flush
    #[arg(short = 'm', long, default_value = "64")]
    memtable_mb: usize,
}

fn main() {
    let args = Args::parse();

    let log_file = match init_logging(&args) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to set up logging: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        from = %args.source.display(),
        to = %args.destination.display(),
        "kvreconcile v{}: copying missing data",
        kvreconcile::VERSION
    );
    if let Some(path) = log_file {
        tracing::info!(path = %path.display(), "saving logs");
    }

    match config_from(&args).and_then(|config| run(&config)) {
        Ok(report) => {
            tracing::info!(
                stores = report.stores.len(),
                inserted = report.total_inserted(),
                skipped = report.total_skipped(),
                "reconciliation complete"
            );
        }
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn config_from(args: &Args) -> kvreconcile::Result<Config> {
    Config::builder()
        .source_dir(&args.source)
        .destination_dir(&args.destination)
        .memtable_size_mb(args.memtable_mb)
        .build()
}

fn run(config: &Config) -> kvreconcile::Result<ReconcileReport> {
    let directories = DirectoriesHandler::new(&config.source_dir, &config.destination_dir)?;

    let reconciler = Reconciler::builder()
        .directories(Arc::new(directories))
        .source(Arc::new(DiskStoreHandle::new(config.store)))
        .destination(Arc::new(DiskStoreHandle::new(config.store)))
        .build()?;

    reconciler.process()
}

/// Install the global subscriber; returns the log file path when saving
fn init_logging(args: &Args) -> std::io::Result<Option<PathBuf>> {
    let filter = match &args.log_level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let (file_layer, log_path) = if args.log_save {
        fs::create_dir_all("logs")?;
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = PathBuf::from("logs").join(format!("kvreconcile-{}.log", secs));
        let file = File::create(&path)?;

        let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    Ok(log_path)
}
