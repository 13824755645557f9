use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

use super::{BulkOutcome, DocumentStore, Rejection};
use crate::error::StoreError;
use crate::record::Cable;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// A CouchDB database addressed by URL, e.g. `http://user:pw@localhost:5984/cables`.
pub struct CouchStore {
    client: Client,
    db_url: String,
}

#[derive(Deserialize)]
struct AllDocs {
    rows: Vec<AllDocsRow>,
}

#[derive(Deserialize)]
struct AllDocsRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BulkDocResult {
    id: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl CouchStore {
    /// Connect and create the database if it does not exist yet.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let db_url = url.trim_end_matches('/').to_string();
        let has_db_segment = db_url
            .split_once("://")
            .and_then(|(_, rest)| rest.split_once('/'))
            .is_some_and(|(_, db)| !db.is_empty());
        if !has_db_segment {
            return Err(StoreError::InvalidUri(url.to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let store = CouchStore { client, db_url };
        store.ensure_database()?;
        Ok(store)
    }

    fn ensure_database(&self) -> Result<(), StoreError> {
        let resp = self.client.head(&self.db_url).send()?;
        if resp.status() != StatusCode::NOT_FOUND {
            check(resp, &self.db_url)?;
            return Ok(());
        }
        info!("Creating database {}", self.db_url);
        let resp = self.client.put(&self.db_url).send()?;
        // 412: created concurrently by someone else
        if resp.status() == StatusCode::PRECONDITION_FAILED {
            return Ok(());
        }
        check(resp, &self.db_url)?;
        Ok(())
    }
}

impl DocumentStore for CouchStore {
    fn all_ids(&self) -> Result<Vec<String>, StoreError> {
        let url = format!("{}/_all_docs", self.db_url);
        let resp = check(self.client.get(&url).send()?, &url)?;
        let docs: AllDocs = serde_json::from_str(&resp.text()?)?;
        Ok(docs.rows.into_iter().map(|r| r.id).collect())
    }

    fn bulk_save(&self, docs: &[Cable]) -> Result<BulkOutcome, StoreError> {
        let url = format!("{}/_bulk_docs", self.db_url);
        let body = serde_json::json!({ "docs": docs });
        let resp = check(self.client.post(&url).json(&body).send()?, &url)?;
        let results: Vec<BulkDocResult> = serde_json::from_str(&resp.text()?)?;
        Ok(outcome_from_results(results))
    }
}

fn outcome_from_results(results: Vec<BulkDocResult>) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    for r in results {
        match r.error {
            None => outcome.accepted += 1,
            Some(error) => outcome.rejected.push(Rejection {
                id: r.id,
                reason: match r.reason {
                    Some(reason) => format!("{}: {}", error, reason),
                    None => error,
                },
            }),
        }
    }
    outcome
}

/// Turn a non-success status into a fatal store error.
fn check(resp: Response, url: &str) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}
