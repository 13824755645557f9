use std::collections::HashSet;

use tracing::info;

use crate::error::StoreError;
use crate::store::DocumentStore;

/// Identifiers already present in the store when the run started.
///
/// Loaded once and never refreshed: documents written by other processes
/// during the run are not seen here.
#[derive(Debug, Default)]
pub struct ExistingKeys {
    ids: HashSet<String>,
}

impl ExistingKeys {
    pub fn load(store: &dyn DocumentStore) -> Result<Self, StoreError> {
        let keys: ExistingKeys = store.all_ids()?.into_iter().collect();
        info!("Loaded {} existing document ids", keys.len());
        Ok(keys)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

impl FromIterator<String> for ExistingKeys {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        ExistingKeys {
            ids: iter.into_iter().collect(),
        }
    }
}
