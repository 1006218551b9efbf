//! Rate source abstraction

use crate::core::currency::{Currency, RateCacheEntry};
use crate::core::error::RateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One link of the converter's fallback chain.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Produces a rate table quoted against `pivot`.
    ///
    /// `now` is the converter's clock reading; sources stamp fresh tables with
    /// it and use it to judge the age of stored ones.
    async fn fetch(&self, pivot: Currency, now: DateTime<Utc>) -> Result<RateCacheEntry, RateError>;

    /// Whether a table from this source is written back to durable storage.
    fn persist_on_success(&self) -> bool {
        false
    }
}
