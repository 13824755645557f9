//! Traversal → extraction → dedup, as a pull-based iterator of new cables.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::ExtractError;
use crate::index::ExistingKeys;
use crate::parser;
use crate::record::Cable;
use crate::walk::CableFiles;

/// Run counters, updated only by the processor's consuming thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    /// Files that parsed into a cable, new or not.
    pub processed: usize,
    /// Cables yielded downstream.
    pub new: usize,
    /// Parsed cables whose id was already known.
    pub duplicates: usize,
    /// Files that failed extraction.
    pub failed: usize,
}

impl Counters {
    fn candidate(&mut self) {
        self.processed += 1;
    }

    /// Undo the speculative `candidate` increment.
    fn unparsed(&mut self) {
        self.processed -= 1;
        self.failed += 1;
    }
}

/// Yields every cable under the root whose id is neither in the start-of-run
/// snapshot nor already yielded earlier in this run.
///
/// Files are extracted in rounds of `chunk` paths (in parallel with the
/// `rayon` feature) and consumed in traversal order. Single pass: once it
/// returns `None` it stays exhausted.
pub struct Processor {
    files: CableFiles,
    keys: ExistingKeys,
    seen: HashSet<String>,
    ready: VecDeque<Cable>,
    chunk: usize,
    cancel: CancellationToken,
    counters: Counters,
    exhausted: bool,
    interrupted: bool,
}

impl Processor {
    pub fn new(files: CableFiles, keys: ExistingKeys, chunk: usize, cancel: CancellationToken) -> Self {
        Processor {
            files,
            keys,
            seen: HashSet::new(),
            ready: VecDeque::new(),
            chunk: chunk.max(1),
            cancel,
            counters: Counters::default(),
            exhausted: false,
            interrupted: false,
        }
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// True when cancellation left files unvisited or unextracted.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    fn fill(&mut self) {
        let paths: Vec<PathBuf> = self.files.by_ref().take(self.chunk).collect();
        if paths.is_empty() {
            self.exhausted = true;
            return;
        }
        for (path, result) in extract_round(paths, &self.cancel) {
            // None: skipped after cancellation, never became a candidate
            match result {
                Some(result) => self.admit(&path, result),
                None => self.interrupted = true,
            }
        }
    }

    fn admit(&mut self, path: &Path, result: Result<Cable, ExtractError>) {
        self.counters.candidate();
        match result {
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cable not processed");
                self.counters.unparsed();
            }
            Ok(cable) if self.keys.contains(&cable.id) || self.seen.contains(&cable.id) => {
                debug!(path = %path.display(), id = %cable.id, "Already stored");
                self.counters.duplicates += 1;
            }
            Ok(cable) => {
                debug!(path = %path.display(), id = %cable.id, "New cable");
                self.seen.insert(cable.id.clone());
                self.counters.new += 1;
                self.ready.push_back(cable);
            }
        }
    }
}

type Extracted = (PathBuf, Option<Result<Cable, ExtractError>>);

fn extract_one(path: PathBuf, cancel: &CancellationToken) -> Extracted {
    if cancel.is_cancelled() {
        return (path, None);
    }
    debug!(path = %path.display(), "Process");
    let result = parser::parse_file(&path);
    (path, Some(result))
}

#[cfg(feature = "rayon")]
fn extract_round(paths: Vec<PathBuf>, cancel: &CancellationToken) -> Vec<Extracted> {
    paths
        .into_par_iter()
        .map(|p| extract_one(p, cancel))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn extract_round(paths: Vec<PathBuf>, cancel: &CancellationToken) -> Vec<Extracted> {
    paths.into_iter().map(|p| extract_one(p, cancel)).collect()
}

impl Iterator for Processor {
    type Item = Cable;

    fn next(&mut self) -> Option<Cable> {
        loop {
            if let Some(cable) = self.ready.pop_front() {
                return Some(cable);
            }
            if self.exhausted {
                return None;
            }
            if self.cancel.is_cancelled() {
                self.exhausted = true;
                self.interrupted = true;
                return None;
            }
            self.fill();
        }
    }
}
