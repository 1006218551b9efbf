//! Core business logic abstractions

pub mod cache;
pub mod clock;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod schedule;
pub mod source;

// Re-export main types for cleaner imports
pub use clock::{Clock, SystemClock};
pub use currency::{Currency, ExchangeRateTable, PIVOT, RateCacheEntry};
pub use error::RateError;
pub use schedule::{Freshness, RefreshPolicy, ScheduledRefresh};
pub use source::RateSource;
