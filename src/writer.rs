use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::record::Cable;
use crate::store::{DocumentStore, Rejection};

/// What to do when the store rejects part of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PartialFailurePolicy {
    /// Drop rejected documents silently; a later run picks them up if needed.
    #[default]
    Ignore,
    /// Resubmit the rejected documents once, then drop what is still rejected.
    RetryOnce,
    /// Drop rejected documents but hand them back in the report.
    Report,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub submitted: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub retried: usize,
    /// Only filled under `PartialFailurePolicy::Report`.
    pub rejections: Vec<Rejection>,
}

pub struct BulkWriter<'s> {
    store: &'s dyn DocumentStore,
    policy: PartialFailurePolicy,
}

impl<'s> BulkWriter<'s> {
    pub fn new(store: &'s dyn DocumentStore, policy: PartialFailurePolicy) -> Self {
        BulkWriter { store, policy }
    }

    /// Persist one batch. Partial rejections are absorbed per the policy;
    /// only a whole-store failure comes back as `Err`.
    pub fn write(&self, batch: &[Cable]) -> Result<WriteReport, StoreError> {
        let mut outcome = self.store.bulk_save(batch)?;
        let mut retried = 0;

        if self.policy == PartialFailurePolicy::RetryOnce && outcome.is_partial() {
            let ids: HashSet<&str> = outcome.rejected.iter().map(|r| r.id.as_str()).collect();
            let again: Vec<Cable> = batch
                .iter()
                .filter(|c| ids.contains(c.id.as_str()))
                .cloned()
                .collect();
            retried = again.len();
            debug!("Retrying {} rejected documents", retried);
            let second = self.store.bulk_save(&again)?;
            outcome.accepted += second.accepted;
            outcome.rejected = second.rejected;
        }

        let rejected = outcome.rejected.len();
        let mut rejections = Vec::new();
        if rejected > 0 {
            match self.policy {
                PartialFailurePolicy::Report => {
                    for r in &outcome.rejected {
                        warn!(id = %r.id, reason = %r.reason, "Document rejected");
                    }
                    rejections = outcome.rejected;
                }
                PartialFailurePolicy::Ignore | PartialFailurePolicy::RetryOnce => {
                    debug!("{} documents rejected, ignored", rejected);
                }
            }
        }

        info!(
            "Saved batch: {} submitted, {} accepted, {} rejected",
            batch.len(),
            outcome.accepted,
            rejected
        );
        Ok(WriteReport {
            submitted: batch.len(),
            accepted: outcome.accepted,
            rejected,
            retried,
            rejections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{extract_cable, fixtures::cable_html};
    use crate::store::testing::RecordingStore;

    fn cables(ids: &[&str]) -> Vec<Cable> {
        ids.iter().map(|id| extract_cable(&cable_html(id)).unwrap()).collect()
    }

    #[test]
    fn full_success() {
        let store = RecordingStore::default();
        let report = BulkWriter::new(&store, PartialFailurePolicy::Ignore)
            .write(&cables(&["A1", "A2"]))
            .unwrap();
        assert_eq!(report.submitted, 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 0);
        assert_eq!(store.call_sizes(), vec![2]);
    }

    #[test]
    fn ignore_swallows_partial_failure() {
        let store = RecordingStore::default().conflicting(&["A1"]);
        let report = BulkWriter::new(&store, PartialFailurePolicy::Ignore)
            .write(&cables(&["A1", "A2"]))
            .unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 1);
        assert!(report.rejections.is_empty());
        assert_eq!(store.call_sizes(), vec![2]);
    }

    #[test]
    fn retry_once_resubmits_only_rejected() {
        let store = RecordingStore::default().conflicting(&["A1"]);
        let report = BulkWriter::new(&store, PartialFailurePolicy::RetryOnce)
            .write(&cables(&["A1", "A2"]))
            .unwrap();
        assert_eq!(store.calls(), vec![vec!["A1".to_string(), "A2".to_string()], vec!["A1".to_string()]]);
        assert_eq!(report.retried, 1);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 0);
    }

    #[test]
    fn retry_once_gives_up_after_second_rejection() {
        let store = RecordingStore::default().conflicting(&["A1"]).sticky();
        let report = BulkWriter::new(&store, PartialFailurePolicy::RetryOnce)
            .write(&cables(&["A1", "A2"]))
            .unwrap();
        assert_eq!(store.call_sizes(), vec![2, 1]);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 1);
    }

    #[test]
    fn report_returns_rejections() {
        let store = RecordingStore::default().conflicting(&["A2"]);
        let report = BulkWriter::new(&store, PartialFailurePolicy::Report)
            .write(&cables(&["A1", "A2", "A3"]))
            .unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(report.rejections.len(), 1);
        assert_eq!(report.rejections[0].id, "A2");
    }

    #[test]
    fn total_failure_propagates() {
        let store = RecordingStore::default().failing_on_call(0);
        let result = BulkWriter::new(&store, PartialFailurePolicy::Ignore).write(&cables(&["A1"]));
        assert!(matches!(result, Err(StoreError::Status { status: 503, .. })));
    }

    #[test]
    fn policy_names() {
        let p: PartialFailurePolicy = serde_json::from_str("\"retry-once\"").unwrap();
        assert_eq!(p, PartialFailurePolicy::RetryOnce);
        assert_eq!(PartialFailurePolicy::default(), PartialFailurePolicy::Ignore);
    }
}
