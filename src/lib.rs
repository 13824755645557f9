//! Cablegate ingestion: walk a tree of cable pages, extract each cable, skip
//! the ones the store already holds and bulk-save the rest.

pub mod batch;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod parser;
pub mod processor;
pub mod record;
pub mod store;
pub mod walk;
pub mod writer;

pub use error::{ExtractError, PipelineError, SettingsError, StoreError};
pub use ingest::{run, Summary};
pub use record::Cable;
