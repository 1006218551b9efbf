use crate::core::currency::{Currency, ExchangeRateTable, RateCacheEntry, symbols_param};
use crate::core::error::RateError;
use crate::core::source::RateSource;
use crate::providers::util::HttpClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Public exchange rate provider queried first.
pub struct ExchangeRateHostSource {
    base_url: String,
    client: HttpClient,
}

impl ExchangeRateHostSource {
    pub fn new(base_url: &str, client: HttpClient) -> Self {
        ExchangeRateHostSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    success: bool,
    base: Option<String>,
    date: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateSource for ExchangeRateHostSource {
    fn name(&self) -> &'static str {
        "exchangerate.host"
    }

    #[instrument(name = "PrimaryRatesFetch", skip(self, now), fields(pivot = %pivot))]
    async fn fetch(
        &self,
        pivot: Currency,
        now: DateTime<Utc>,
    ) -> Result<RateCacheEntry, RateError> {
        let url = format!(
            "{}/latest?base={}&symbols={}",
            self.base_url,
            pivot,
            symbols_param()
        );
        let data: LatestRatesResponse = self.client.get_json(&url).await?;
        debug!(base = ?data.base, date = ?data.date, "Received exchange rate response");

        if !data.success || data.rates.is_empty() {
            return Err(RateError::InvalidResponse {
                url,
                reason: "Invalid response from exchange rate API".to_string(),
            });
        }
        if let Some(base) = data.base.as_deref()
            && base.parse::<Currency>().ok() != Some(pivot)
        {
            return Err(RateError::InvalidResponse {
                url,
                reason: format!("rates quoted in {base}, requested {pivot}"),
            });
        }

        let rates = ExchangeRateTable::from_response(&data.rates, pivot, &url)?;
        Ok(RateCacheEntry::new(rates, now, pivot))
    }

    fn persist_on_success(&self) -> bool {
        true
    }
}
