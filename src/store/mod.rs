//! Destination document store.
//!
//! The pipeline needs two things from a store: the ids it already holds, and
//! a bulk save that may accept some documents while rejecting others.

pub mod couch;
pub mod sqlite;

use crate::error::StoreError;
use crate::record::Cable;

pub use couch::CouchStore;
pub use sqlite::SqliteStore;

/// One document the store refused during a bulk save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub id: String,
    pub reason: String,
}

/// Result of a bulk save that reached the store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub accepted: usize,
    pub rejected: Vec<Rejection>,
}

impl BulkOutcome {
    pub fn is_partial(&self) -> bool {
        !self.rejected.is_empty()
    }
}

pub trait DocumentStore {
    /// Every document id currently in the store.
    fn all_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Save `docs` in one logical operation.
    ///
    /// Per-document rejections come back in the outcome; `Err` means the
    /// store as a whole could not take the batch.
    fn bulk_save(&self, docs: &[Cable]) -> Result<BulkOutcome, StoreError>;
}

/// Open the store named by `uri`.
///
/// `http(s)://host/db` is a CouchDB database; `sqlite:PATH`, `sqlite://PATH`
/// or a bare path is a SQLite file. Either is created when missing.
pub fn open(uri: &str) -> Result<Box<dyn DocumentStore>, StoreError> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(Box::new(CouchStore::open(uri)?));
    }
    let path = uri
        .strip_prefix("sqlite://")
        .or_else(|| uri.strip_prefix("sqlite:"))
        .unwrap_or(uri);
    if path.is_empty() {
        return Err(StoreError::InvalidUri(uri.to_string()));
    }
    Ok(Box::new(SqliteStore::open(path)?))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;

    use super::*;

    /// In-memory store that records every bulk save and can inject
    /// per-document conflicts or whole-batch failures.
    #[derive(Default)]
    pub struct RecordingStore {
        existing: Vec<String>,
        stored: RefCell<HashSet<String>>,
        conflicts: RefCell<HashSet<String>>,
        sticky_conflicts: bool,
        fail_on_call: Option<usize>,
        fail_id_load: bool,
        calls: RefCell<Vec<Vec<String>>>,
        id_loads: Cell<usize>,
    }

    impl RecordingStore {
        pub fn with_existing(ids: &[&str]) -> Self {
            RecordingStore {
                existing: ids.iter().map(|s| s.to_string()).collect(),
                stored: RefCell::new(ids.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            }
        }

        /// Reject these ids once, as if another writer got there first.
        pub fn conflicting(self, ids: &[&str]) -> Self {
            self.conflicts.borrow_mut().extend(ids.iter().map(|s| s.to_string()));
            self
        }

        /// Keep rejecting conflicting ids on every attempt.
        pub fn sticky(mut self) -> Self {
            self.sticky_conflicts = true;
            self
        }

        /// Fail the whole `n`th (zero-based) bulk save.
        pub fn failing_on_call(mut self, n: usize) -> Self {
            self.fail_on_call = Some(n);
            self
        }

        pub fn failing_id_load(mut self) -> Self {
            self.fail_id_load = true;
            self
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }

        pub fn call_sizes(&self) -> Vec<usize> {
            self.calls.borrow().iter().map(Vec::len).collect()
        }

        pub fn stored(&self) -> HashSet<String> {
            self.stored.borrow().clone()
        }

        pub fn id_loads(&self) -> usize {
            self.id_loads.get()
        }
    }

    impl DocumentStore for RecordingStore {
        fn all_ids(&self) -> Result<Vec<String>, StoreError> {
            self.id_loads.set(self.id_loads.get() + 1);
            if self.fail_id_load {
                return Err(StoreError::InvalidUri("unreachable".into()));
            }
            Ok(self.existing.clone())
        }

        fn bulk_save(&self, docs: &[Cable]) -> Result<BulkOutcome, StoreError> {
            let call = self.calls.borrow().len();
            self.calls
                .borrow_mut()
                .push(docs.iter().map(|d| d.id.clone()).collect());
            if self.fail_on_call == Some(call) {
                return Err(StoreError::Status {
                    status: 503,
                    url: "memory".into(),
                    body: "unavailable".into(),
                });
            }

            let mut outcome = BulkOutcome::default();
            for doc in docs {
                let conflicted = if self.sticky_conflicts {
                    self.conflicts.borrow().contains(&doc.id)
                } else {
                    self.conflicts.borrow_mut().remove(&doc.id)
                };
                if conflicted || !self.stored.borrow_mut().insert(doc.id.clone()) {
                    outcome.rejected.push(Rejection {
                        id: doc.id.clone(),
                        reason: "conflict".into(),
                    });
                } else {
                    outcome.accepted += 1;
                }
            }
            Ok(outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_sqlite_from_prefixed_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cables.sqlite");
        let store = open(&format!("sqlite://{}", path.display())).unwrap();
        assert!(store.all_ids().unwrap().is_empty());
        assert!(path.exists());
    }

    #[test]
    fn opens_sqlite_from_bare_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.sqlite");
        open(path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_empty_sqlite_path() {
        assert!(matches!(open("sqlite:"), Err(StoreError::InvalidUri(_))));
    }
}
