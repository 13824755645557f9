//! Error types for every layer of the ingestion run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single document produced no record.
///
/// These are routine outcomes: the processor logs them, counts them and
/// moves on to the next file.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The cable table or one of the two `<pre>` blocks is absent.
    #[error("structure not found: {0}")]
    StructureNotFound(&'static str),

    /// The cable table exists but a positional field is absent or empty.
    #[error("field missing: {0}")]
    FieldMissing(&'static str),

    /// The document could not be read or is not valid UTF-8.
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures of the destination store. All of these are fatal to a run;
/// per-document rejections are reported through `BulkOutcome` instead.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid store URI: {0}")]
    InvalidUri(String),
}

/// Fatal errors that abort the orchestrated run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cables root {path:?} is not a readable directory: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("{0} must be a positive integer")]
    NotPositive(&'static str),

    #[error("suffix must not be empty")]
    EmptySuffix,
}
