//! Marketplace backend: secondary rate source and server-side price conversion

use crate::core::currency::{Currency, ExchangeRateTable, RateCacheEntry};
use crate::core::error::RateError;
use crate::core::source::RateSource;
use crate::providers::util::HttpClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error};

const EXCHANGE_RATES_PATH: &str = "/products/exchange-rates/";
const CONVERT_PRICE_PATH: &str = "/products/convert-price/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertPriceRequest {
    pub amount: f64,
    pub from_currency: String,
    pub to_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertPriceResponse {
    pub success: bool,
    pub original_amount: f64,
    pub original_currency: String,
    pub converted_amount: f64,
    pub target_currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BackendRatesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[derive(Clone, Debug)]
pub struct BackendApi {
    base_url: String,
    client: HttpClient,
}

impl BackendApi {
    pub fn new(base_url: &str, client: HttpClient) -> Self {
        BackendApi {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Asks the backend to convert a price. Errors are returned, never retried
    /// against another source.
    pub async fn convert_price(
        &self,
        request: &ConvertPriceRequest,
    ) -> Result<ConvertPriceResponse, RateError> {
        let url = format!("{}{}", self.base_url, CONVERT_PRICE_PATH);
        let response: ConvertPriceResponse = self
            .client
            .post_json(&url, request)
            .await
            .inspect_err(|e| error!(error = %e, "Error converting price via API"))?;
        debug!(?response, "Received conversion response");
        Ok(response)
    }
}

#[async_trait]
impl RateSource for BackendApi {
    fn name(&self) -> &'static str {
        "backend"
    }

    async fn fetch(
        &self,
        pivot: Currency,
        now: DateTime<Utc>,
    ) -> Result<RateCacheEntry, RateError> {
        let url = format!("{}{}", self.base_url, EXCHANGE_RATES_PATH);
        let data: BackendRatesResponse = self.client.get_json(&url).await?;

        if !data.success || data.rates.is_empty() {
            return Err(RateError::InvalidResponse {
                url,
                reason: "unsuccessful or empty rate table".to_string(),
            });
        }

        // the endpoint takes no base and always quotes per 1 USD
        let usd = ExchangeRateTable::from_response(&data.rates, Currency::Usd, &url)?;
        let rates = usd.rebase(pivot)?;
        Ok(RateCacheEntry::new(rates, now, pivot))
    }
}
