//! Cached currency conversion over a fallback chain of rate sources

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::AppConfig;
use crate::core::currency::{Currency, ExchangeRateTable, PIVOT, RateCacheEntry};
use crate::core::error::RateError;
use crate::core::schedule::{CACHE_DURATION_HOURS, RefreshPolicy, ScheduledRefresh};
use crate::core::source::RateSource;
use crate::providers::{
    BackendApi, ConvertPriceRequest, ConvertPriceResponse, ExchangeRateHostSource,
    HardcodedSource, HttpClient, PersistedSource,
};
use crate::store::RateStorage;
use anyhow::{Context, Result};
use chrono::Duration;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Diagnostic snapshot of the in-memory cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    pub has_rates: bool,
    pub last_fetch_ms: i64,
    pub age_ms: i64,
}

pub struct CurrencyConverter {
    sources: Vec<Box<dyn RateSource>>,
    storage: RateStorage,
    clock: Arc<dyn Clock>,
    policy: Box<dyn RefreshPolicy>,
    cache_duration: Duration,
    remote: Option<BackendApi>,
    cache: Mutex<Option<RateCacheEntry>>,
}

impl CurrencyConverter {
    pub fn new(
        sources: Vec<Box<dyn RateSource>>,
        storage: RateStorage,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sources,
            storage,
            clock,
            policy: Box::new(ScheduledRefresh::default()),
            cache_duration: Duration::hours(CACHE_DURATION_HOURS),
            remote: None,
            cache: Mutex::new(None),
        }
    }

    /// Standard chain: primary provider, backend, stored rates, hardcoded table.
    pub fn from_config(config: &AppConfig, storage: RateStorage) -> Result<Self> {
        let client = HttpClient::new(&config.http).context("Failed to build HTTP client")?;
        let backend = BackendApi::new(&config.providers.backend.base_url, client.clone());

        let sources: Vec<Box<dyn RateSource>> = vec![
            Box::new(ExchangeRateHostSource::new(
                &config.providers.primary.base_url,
                client,
            )),
            Box::new(backend.clone()),
            Box::new(PersistedSource::with_max_age(
                storage.clone(),
                config.cache.persisted_max_age(),
            )),
            Box::new(HardcodedSource),
        ];

        Ok(Self::new(sources, storage, Arc::new(SystemClock))
            .with_policy(config.cache.refresh_policy()?)
            .with_cache_duration(config.cache.cache_duration())
            .with_remote(backend))
    }

    pub fn with_policy(mut self, policy: impl RefreshPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Age limit used by `are_rates_fresh`.
    pub fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
        self.cache_duration = cache_duration;
        self
    }

    pub fn with_remote(mut self, remote: BackendApi) -> Self {
        self.remote = Some(remote);
        self
    }

    fn cache(&self) -> MutexGuard<'_, Option<RateCacheEntry>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached table if the refresh policy allows it, otherwise a fresh fetch.
    pub async fn get_exchange_rates(&self) -> ExchangeRateTable {
        self.current_entry().await.rates
    }

    async fn current_entry(&self) -> RateCacheEntry {
        let now = self.clock.now();
        let cached = self.cache().clone();
        if let Some(entry) = cached {
            if !self.policy.refresh_due(now, entry.fetched_at()) {
                debug!("Cache HIT for exchange rates");
                return entry;
            }
            debug!("Cached exchange rates are due for refresh");
        }
        self.fetch_entry(PIVOT).await
    }

    /// Walks the source chain for `pivot`; the first table obtained wins.
    pub async fn fetch_rates(&self, pivot: Currency) -> ExchangeRateTable {
        self.fetch_entry(pivot).await.rates
    }

    async fn fetch_entry(&self, pivot: Currency) -> RateCacheEntry {
        info!(%pivot, "Fetching exchange rates");
        let now = self.clock.now();

        for source in &self.sources {
            match source.fetch(pivot, now).await {
                Ok(entry) => {
                    info!(source = source.name(), rates = ?entry.rates, "Exchange rates updated");
                    if source.persist_on_success()
                        && let Err(e) = self.storage.save(&entry)
                    {
                        warn!(error = %e, "Failed to persist exchange rates");
                    }
                    *self.cache() = Some(entry.clone());
                    return entry;
                }
                Err(e) => warn!(source = source.name(), error = %e, "Rate source failed"),
            }
        }

        warn!("All rate sources failed, using fallback exchange rates");
        let entry = HardcodedSource::entry(pivot, now);
        *self.cache() = Some(entry.clone());
        entry
    }

    /// Converts `amount` between two currency codes, rounded to cents.
    ///
    /// Never fails: non-positive amounts give 0, unusable codes or rates give
    /// `amount` back unchanged.
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        if from == to {
            return amount;
        }

        let (from_currency, to_currency) = match (from.parse::<Currency>(), to.parse::<Currency>())
        {
            (Ok(f), Ok(t)) => (f, t),
            _ => {
                warn!("Unsupported currency conversion: {} -> {}", from, to);
                return amount;
            }
        };
        if from_currency == to_currency {
            return amount;
        }

        let entry = self.current_entry().await;
        match entry
            .rates
            .convert(entry.base, amount, from_currency, to_currency)
        {
            Ok(converted) => converted,
            Err(e) => {
                warn!(error = %e, "Currency conversion failed");
                amount
            }
        }
    }

    /// Converts one amount into every supported currency with a single rate lookup.
    pub async fn convert_to_all(&self, amount: f64, from: Currency) -> BTreeMap<Currency, f64> {
        if amount.is_nan() || amount <= 0.0 {
            return Currency::ALL.iter().map(|c| (*c, 0.0)).collect();
        }

        let entry = self.current_entry().await;
        Currency::ALL
            .iter()
            .map(|to| {
                let value = if *to == from {
                    amount
                } else {
                    entry
                        .rates
                        .convert(entry.base, amount, from, *to)
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "Currency conversion failed");
                            0.0
                        })
                };
                (*to, value)
            })
            .collect()
    }

    /// Server-side conversion; nothing is cached and errors reach the caller.
    pub async fn convert_price_via_api(
        &self,
        request: &ConvertPriceRequest,
    ) -> Result<ConvertPriceResponse, RateError> {
        let remote = self.remote.as_ref().ok_or(RateError::RemoteNotConfigured)?;
        remote.convert_price(request).await
    }

    /// Drops every cached table, then fetches anew.
    pub async fn refresh_rates(&self, pivot: Currency) -> ExchangeRateTable {
        self.clear_cache();
        self.fetch_rates(pivot).await
    }

    pub fn clear_cache(&self) {
        *self.cache() = None;
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to remove stored exchange rates");
        }
        debug!("Exchange rate cache cleared");
    }

    pub fn get_cache_info(&self) -> CacheInfo {
        let now = self.clock.now();
        match self.cache().as_ref() {
            Some(entry) => CacheInfo {
                has_rates: true,
                last_fetch_ms: entry.last_fetch_ms,
                age_ms: entry.age_ms(now),
            },
            None => CacheInfo {
                has_rates: false,
                last_fetch_ms: 0,
                age_ms: 0,
            },
        }
    }

    /// Whether cached rates are younger than the cache duration. The scheduled
    /// update hours are not considered here.
    pub fn are_rates_fresh(&self) -> bool {
        let now = self.clock.now();
        self.cache()
            .as_ref()
            .is_some_and(|entry| entry.age_ms(now) < self.cache_duration.num_milliseconds())
    }

    /// Pivot of the cached table, if any.
    pub fn cached_base(&self) -> Option<Currency> {
        self.cache().as_ref().map(|entry| entry.base)
    }
}
