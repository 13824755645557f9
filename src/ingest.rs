//! One ingestion run: snapshot keys, stream new cables, write them in batches.

use std::fs;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::batch::Batches;
use crate::config::Settings;
use crate::error::PipelineError;
use crate::index::ExistingKeys;
use crate::processor::{Counters, Processor};
use crate::store::{DocumentStore, Rejection};
use crate::walk::CableFiles;
use crate::writer::{BulkWriter, WriteReport};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub counters: Counters,
    pub batches: usize,
    pub written: usize,
    pub rejected: usize,
    pub retried: usize,
    pub rejections: Vec<Rejection>,
    pub cancelled: bool,
}

impl Summary {
    fn absorb(&mut self, report: WriteReport) {
        self.batches += 1;
        self.written += report.accepted;
        self.rejected += report.rejected;
        self.retried += report.retried;
        self.rejections.extend(report.rejections);
    }
}

/// Ingest every new cable under `root` into `store`.
///
/// Batches are written one after another; `on_batch` sees each report as it
/// lands. A fatal store error stops the run before the next batch.
/// Cancellation stops traversal, flushes what was already extracted and
/// returns a summary with `cancelled` set, unless every file had already
/// been processed when it arrived.
pub fn run(
    store: &dyn DocumentStore,
    root: &Path,
    settings: &Settings,
    cancel: CancellationToken,
    mut on_batch: impl FnMut(&WriteReport),
) -> Result<Summary, PipelineError> {
    settings.check()?;
    let size = settings.batch_size()?;
    fs::read_dir(root).map_err(|source| PipelineError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    info!("Start processing {}", root.display());
    let keys = ExistingKeys::load(store)?;
    let processor = Processor::new(
        CableFiles::new(root, &settings.suffix),
        keys,
        settings.extract_chunk,
        cancel,
    );
    let writer = BulkWriter::new(store, settings.partial_failure);
    let mut summary = Summary::default();

    let mut batches = Batches::new(processor, size);
    while let Some(batch) = batches.next() {
        info!("Sending {} cables to the store", batch.len());
        match writer.write(&batch) {
            Ok(report) => {
                on_batch(&report);
                summary.absorb(report);
            }
            Err(e) => {
                let c = batches.get_ref().counters();
                error!(
                    processed = c.processed,
                    new = c.new,
                    batches = summary.batches,
                    "Bulk write failed, aborting run"
                );
                return Err(e.into());
            }
        }
    }

    summary.counters = batches.get_ref().counters();
    summary.cancelled = batches.get_ref().interrupted();
    if summary.cancelled {
        warn!("Run interrupted; remaining files were not processed");
    }
    info!("{} cables processed.", summary.counters.processed);
    info!("{} new cables.", summary.counters.new);
    Ok(summary)
}
