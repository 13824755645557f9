use std::num::NonZeroUsize;

use config::{Config, Environment};
use serde::Deserialize;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::SettingsError;
use crate::writer::PartialFailurePolicy;

pub const ENV_PREFIX: &str = "CABLEGATE";
const DEFAULT_SUFFIX: &str = ".html";
const DEFAULT_EXTRACT_CHUNK: usize = 256;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub batch_size: usize,
    pub suffix: String,
    pub partial_failure: PartialFailurePolicy,
    /// Files extracted per parallel round.
    pub extract_chunk: usize,
    /// Extraction threads; rayon's default when unset.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            batch_size: DEFAULT_BATCH_SIZE,
            suffix: DEFAULT_SUFFIX.to_string(),
            partial_failure: PartialFailurePolicy::Ignore,
            extract_chunk: DEFAULT_EXTRACT_CHUNK,
            workers: None,
        }
    }
}

impl Settings {
    /// Defaults overlaid with `CABLEGATE_*` environment variables.
    pub fn load() -> Result<Self, SettingsError> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_env(env: Environment) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("batch_size", DEFAULT_BATCH_SIZE as i64)?
            .set_default("suffix", DEFAULT_SUFFIX)?
            .set_default("partial_failure", "ignore")?
            .set_default("extract_chunk", DEFAULT_EXTRACT_CHUNK as i64)?
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()
    }

    pub fn validate(self) -> Result<Self, SettingsError> {
        self.check()?;
        Ok(self)
    }

    pub fn check(&self) -> Result<(), SettingsError> {
        self.batch_size()?;
        if self.extract_chunk == 0 {
            return Err(SettingsError::NotPositive("extract_chunk"));
        }
        if self.workers == Some(0) {
            return Err(SettingsError::NotPositive("workers"));
        }
        if self.suffix.is_empty() {
            return Err(SettingsError::EmptySuffix);
        }
        Ok(())
    }

    pub fn batch_size(&self) -> Result<NonZeroUsize, SettingsError> {
        NonZeroUsize::new(self.batch_size).ok_or(SettingsError::NotPositive("batch_size"))
    }
}
