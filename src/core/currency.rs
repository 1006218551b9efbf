//! Supported currencies, exchange rate tables and the cached rate entry

use crate::core::error::RateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;

/// Currency all rates are quoted against unless a caller asks otherwise.
pub const PIVOT: Currency = Currency::Usd;

const PIVOT_RATE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Kzt,
    Rub,
    Usd,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Kzt, Currency::Rub, Currency::Usd];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Kzt => "KZT",
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Kzt => "₸",
            Currency::Rub => "₽",
            Currency::Usd => "$",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KZT" => Ok(Currency::Kzt),
            "RUB" => Ok(Currency::Rub),
            "USD" => Ok(Currency::Usd),
            _ => Err(RateError::UnsupportedCurrency(s.to_string())),
        }
    }
}

/// Codes of every supported currency, in display order.
pub fn supported_currencies() -> Vec<&'static str> {
    Currency::ALL.iter().map(Currency::code).collect()
}

/// Comma-joined supported codes, as sent in the `symbols` query parameter.
pub fn symbols_param() -> String {
    supported_currencies().join(",")
}

/// Units of each currency per one unit of the pivot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRateTable {
    rates: BTreeMap<Currency, f64>,
}

impl ExchangeRateTable {
    /// Builds a table from a provider payload.
    ///
    /// Unknown codes are ignored and a missing pivot is implied at 1.0. Every
    /// supported currency must end up with a positive, finite rate, and the
    /// pivot's own rate must be 1.0.
    pub fn from_response(
        raw: &HashMap<String, f64>,
        pivot: Currency,
        source: &str,
    ) -> Result<Self, RateError> {
        let mut rates = BTreeMap::new();
        for (code, rate) in raw {
            let Ok(currency) = code.parse::<Currency>() else {
                continue;
            };
            if !rate.is_finite() || *rate <= 0.0 {
                return Err(RateError::InvalidResponse {
                    url: source.to_string(),
                    reason: format!("rate for {currency} is not positive: {rate}"),
                });
            }
            rates.insert(currency, *rate);
        }
        let pivot_rate = *rates.entry(pivot).or_insert(1.0);
        if (pivot_rate - 1.0).abs() > PIVOT_RATE_TOLERANCE {
            return Err(RateError::InvalidResponse {
                url: source.to_string(),
                reason: format!("rates are not quoted in {pivot}: {pivot} = {pivot_rate}"),
            });
        }

        if let Some(missing) = Currency::ALL.iter().find(|c| !rates.contains_key(*c)) {
            return Err(RateError::InvalidResponse {
                url: source.to_string(),
                reason: format!("rate table has no entry for {missing}"),
            });
        }
        Ok(Self { rates })
    }

    pub fn get(&self, currency: Currency) -> Option<f64> {
        self.rates.get(&currency).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        self.rates.iter().map(|(c, r)| (*c, *r))
    }

    /// Re-expresses the table against another pivot present in it.
    pub fn rebase(&self, pivot: Currency) -> Result<Self, RateError> {
        let divisor = self
            .get(pivot)
            .filter(|r| *r > 0.0)
            .ok_or(RateError::MissingRate(pivot))?;
        Ok(self.iter().map(|(c, r)| (c, r / divisor)).collect())
    }

    /// Converts `amount` quoted in `from` into `to`, rounded to cents.
    ///
    /// `pivot` is the currency this table is quoted against; its own rate is
    /// never consulted.
    pub fn convert(
        &self,
        pivot: Currency,
        amount: f64,
        from: Currency,
        to: Currency,
    ) -> Result<f64, RateError> {
        let mut pivot_amount = amount;
        if from != pivot {
            let rate = self.usable_rate(from)?;
            pivot_amount = amount / rate;
        }

        if to == pivot {
            return Ok(round_cents(pivot_amount));
        }
        let rate = self.usable_rate(to)?;
        Ok(round_cents(pivot_amount * rate))
    }

    fn usable_rate(&self, currency: Currency) -> Result<f64, RateError> {
        self.get(currency)
            .filter(|r| *r != 0.0)
            .ok_or(RateError::MissingRate(currency))
    }
}

impl FromIterator<(Currency, f64)> for ExchangeRateTable {
    fn from_iter<T: IntoIterator<Item = (Currency, f64)>>(iter: T) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

/// Rounds to two decimal places, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A rate table together with when and against what it was fetched.
///
/// Serialized form is the persisted payload: `{ rates, lastFetch, base }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCacheEntry {
    pub rates: ExchangeRateTable,
    #[serde(rename = "lastFetch")]
    pub last_fetch_ms: i64,
    pub base: Currency,
}

impl RateCacheEntry {
    pub fn new(rates: ExchangeRateTable, fetched_at: DateTime<Utc>, base: Currency) -> Self {
        Self {
            rates,
            last_fetch_ms: fetched_at.timestamp_millis(),
            base,
        }
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.last_fetch_ms)
    }

    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis() - self.last_fetch_ms
    }
}
