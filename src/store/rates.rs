use crate::core::cache::KeyValueCollection;
use crate::core::currency::RateCacheEntry;
use crate::core::error::RateError;
use crate::store::KeyValueStore;
use crate::store::memory::MemoryCollection;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

pub const RATES_COLLECTION: &str = "rates";
pub const STORAGE_KEY: &str = "currency_rates";

/// Durable home of the last good rate table, a single JSON value.
#[derive(Clone)]
pub struct RateStorage {
    collection: Arc<dyn KeyValueCollection>,
}

impl RateStorage {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self { collection }
    }

    pub fn from_store(store: &KeyValueStore) -> Result<Self> {
        Ok(Self::new(store.get_collection(RATES_COLLECTION)?))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCollection::new()))
    }

    pub fn load(&self) -> Result<Option<RateCacheEntry>, RateError> {
        let Some(bytes) = self
            .collection
            .get(STORAGE_KEY.as_bytes())
            .map_err(|e| RateError::Storage(e.to_string()))?
        else {
            return Ok(None);
        };
        let entry: RateCacheEntry = serde_json::from_slice(&bytes)?;
        debug!(last_fetch = entry.last_fetch_ms, base = %entry.base, "Loaded stored rates");
        Ok(Some(entry))
    }

    pub fn save(&self, entry: &RateCacheEntry) -> Result<(), RateError> {
        let bytes = serde_json::to_vec(entry)?;
        self.collection
            .put(STORAGE_KEY.as_bytes(), &bytes)
            .map_err(|e| RateError::Storage(e.to_string()))
    }

    pub fn clear(&self) -> Result<(), RateError> {
        self.collection
            .remove(STORAGE_KEY.as_bytes())
            .map_err(|e| RateError::Storage(e.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn save_raw(&self, payload: &[u8]) -> Result<(), RateError> {
        self.collection
            .put(STORAGE_KEY.as_bytes(), payload)
            .map_err(|e| RateError::Storage(e.to_string()))
    }
}
