//! Decides when a cached rate table has to be fetched again

use chrono::{DateTime, Duration, FixedOffset, Local, Timelike, Utc};

pub const CACHE_DURATION_HOURS: i64 = 6;
pub const MIN_REFRESH_INTERVAL_MINUTES: i64 = 60;
pub const UPDATE_HOURS: [u32; 3] = [9, 14, 19];

/// Freshness of the cached table at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    NoRates,
    Fresh,
    /// Inside a scheduled update hour and the last fetch predates it.
    ScheduledWindow,
    Expired,
}

/// Answers whether rates fetched at `last_fetch` must be refreshed at `now`.
pub trait RefreshPolicy: Send + Sync {
    fn refresh_due(&self, now: DateTime<Utc>, last_fetch: Option<DateTime<Utc>>) -> bool;
}

impl<F> RefreshPolicy for F
where
    F: Fn(DateTime<Utc>, Option<DateTime<Utc>>) -> bool + Send + Sync,
{
    fn refresh_due(&self, now: DateTime<Utc>, last_fetch: Option<DateTime<Utc>>) -> bool {
        self(now, last_fetch)
    }
}

/// Rolling TTL combined with fixed daily update hours.
#[derive(Debug, Clone)]
pub struct ScheduledRefresh {
    pub cache_duration: Duration,
    pub min_interval: Duration,
    pub update_hours: Vec<u32>,
    /// Offset the update hours are expressed in.
    pub offset: FixedOffset,
}

impl Default for ScheduledRefresh {
    fn default() -> Self {
        Self {
            cache_duration: Duration::hours(CACHE_DURATION_HOURS),
            min_interval: Duration::minutes(MIN_REFRESH_INTERVAL_MINUTES),
            update_hours: UPDATE_HOURS.to_vec(),
            offset: *Local::now().offset(),
        }
    }
}

impl ScheduledRefresh {
    pub fn freshness(&self, now: DateTime<Utc>, last_fetch: Option<DateTime<Utc>>) -> Freshness {
        let Some(last_fetch) = last_fetch else {
            return Freshness::NoRates;
        };
        let age = now - last_fetch;
        if age > self.cache_duration {
            return Freshness::Expired;
        }

        let hour = now.with_timezone(&self.offset).hour();
        if self.update_hours.contains(&hour) && age > self.min_interval {
            return Freshness::ScheduledWindow;
        }
        Freshness::Fresh
    }
}

impl RefreshPolicy for ScheduledRefresh {
    fn refresh_due(&self, now: DateTime<Utc>, last_fetch: Option<DateTime<Utc>>) -> bool {
        self.freshness(now, last_fetch) != Freshness::Fresh
    }
}
