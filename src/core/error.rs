use crate::core::currency::Currency;
use thiserror::Error;

/// Failures raised while obtaining or applying exchange rates.
///
/// Everything except the server-side conversion call is recovered inside the
/// converter, so these mostly end up in log lines.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("Request error: {source} for URL: {url}")]
    NetworkFailure {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Stored rates are {age_minutes} minutes old, limit is {max_minutes} minutes")]
    StaleCacheRejected { age_minutes: i64, max_minutes: i64 },

    #[error("Stored rates are dated {ahead_minutes} minutes in the future")]
    FetchTimeInFuture { ahead_minutes: i64 },

    #[error("Stored rates are quoted in {found}, expected {expected}")]
    PivotMismatch { expected: Currency, found: Currency },

    #[error("No stored rates")]
    NothingStored,

    #[error("No rate found for {0}")]
    MissingRate(Currency),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Remote conversion endpoint is not configured")]
    RemoteNotConfigured,
}

impl From<serde_json::Error> for RateError {
    fn from(e: serde_json::Error) -> Self {
        RateError::Storage(format!("malformed stored payload: {e}"))
    }
}
