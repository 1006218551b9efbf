use crate::core::config::PERSISTED_MAX_AGE_HOURS;
use crate::core::currency::{Currency, RateCacheEntry};
use crate::core::error::RateError;
use crate::core::source::RateSource;
use crate::store::RateStorage;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// Rates left behind by an earlier successful fetch.
pub struct PersistedSource {
    storage: RateStorage,
    max_age: Duration,
}

impl PersistedSource {
    pub fn new(storage: RateStorage) -> Self {
        Self::with_max_age(storage, Duration::hours(PERSISTED_MAX_AGE_HOURS))
    }

    pub fn with_max_age(storage: RateStorage, max_age: Duration) -> Self {
        Self { storage, max_age }
    }
}

#[async_trait]
impl RateSource for PersistedSource {
    fn name(&self) -> &'static str {
        "storage"
    }

    async fn fetch(
        &self,
        pivot: Currency,
        now: DateTime<Utc>,
    ) -> Result<RateCacheEntry, RateError> {
        let entry = self.storage.load()?.ok_or(RateError::NothingStored)?;

        let age_ms = entry.age_ms(now);
        if age_ms < 0 {
            return Err(RateError::FetchTimeInFuture {
                ahead_minutes: -age_ms / 60_000,
            });
        }
        if age_ms >= self.max_age.num_milliseconds() {
            return Err(RateError::StaleCacheRejected {
                age_minutes: age_ms / 60_000,
                max_minutes: self.max_age.num_minutes(),
            });
        }
        if entry.base != pivot {
            return Err(RateError::PivotMismatch {
                expected: pivot,
                found: entry.base,
            });
        }

        info!(age_minutes = age_ms / 60_000, "Using stored exchange rates");
        Ok(entry)
    }
}
