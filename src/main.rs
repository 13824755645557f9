use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cablegate::config::Settings;
use cablegate::writer::PartialFailurePolicy;

#[derive(Parser)]
#[command(name = "cablegate", about = "Import cable pages into a document store")]
struct Cli {
    /// Destination store: http(s)://host/db for CouchDB, sqlite:PATH or a file path for SQLite
    dburi: String,
    /// Root directory of the cable pages
    cables_path: PathBuf,
    /// Documents per bulk write (overrides CABLEGATE_BATCH_SIZE)
    #[arg(short = 'b', long)]
    batch_size: Option<usize>,
    /// What to do with documents the store rejects (overrides CABLEGATE_PARTIAL_FAILURE)
    #[arg(long, value_enum)]
    partial_failure: Option<PartialFailurePolicy>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load().context("Invalid CABLEGATE_* configuration")?;
    if let Some(n) = cli.batch_size {
        settings.batch_size = n;
    }
    if let Some(p) = cli.partial_failure {
        settings.partial_failure = p;
    }
    Ok(settings.validate()?)
}

#[cfg(feature = "rayon")]
fn size_pool(workers: Option<usize>) -> Result<()> {
    if let Some(n) = workers {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to size the extraction pool")?;
    }
    Ok(())
}

#[cfg(not(feature = "rayon"))]
fn size_pool(workers: Option<usize>) -> Result<()> {
    if workers.is_some() {
        warn!("CABLEGATE_WORKERS ignored: built without the rayon feature");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    info!(settings = ?settings, "Starting cable import");

    size_pool(settings.workers)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, finishing current batch");
            on_signal.cancel();
        }
    });

    let Cli { dburi, cables_path, .. } = cli;
    let summary = tokio::task::spawn_blocking(move || -> Result<cablegate::Summary> {
        let store = cablegate::store::open(&dburi)
            .with_context(|| format!("Failed to open store {}", dburi))?;

        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(200));
        let mut written = 0usize;
        let summary = cablegate::run(store.as_ref(), &cables_path, &settings, cancel, |report| {
            written += report.accepted;
            pb.set_message(format!("{} cables saved", written));
        });
        pb.finish_and_clear();
        Ok(summary?)
    })
    .await
    .context("Import task panicked")??;

    println!("{} cables processed.", summary.counters.processed);
    println!("{} new cables.", summary.counters.new);
    println!(
        "Saved {} in {} batches ({} rejected, {} failed to parse).",
        summary.written, summary.batches, summary.rejected, summary.counters.failed
    );
    for r in &summary.rejections {
        println!("  rejected {}: {}", r.id, r.reason);
    }
    println!("Done in {:.1}s", t0.elapsed().as_secs_f64());

    if summary.cancelled {
        anyhow::bail!("interrupted before all cables were processed");
    }
    Ok(())
}
