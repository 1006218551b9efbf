//! Human readable prices

use crate::converter::CurrencyConverter;
use crate::core::currency::{Currency, round_cents};

/// Rounds to cents, groups thousands and appends the currency symbol.
///
/// Trailing fractional zeros are dropped, so `1500.50` renders as `1,500.5`.
pub fn format_price_with_currency(price: f64, currency: &str) -> String {
    let amount = group_thousands(round_cents(price));
    match currency.parse::<Currency>() {
        Ok(c) => format!("{amount} {}", c.symbol()),
        Err(_) => format!("{amount} {currency}"),
    }
}

/// `Price: <KZT> | <RUB> | <USD>`, or just the original price when its
/// currency is not supported.
pub async fn format_price(converter: &CurrencyConverter, price: f64, currency: &str) -> String {
    let Ok(from) = currency.parse::<Currency>() else {
        return format!("Price: {}", format_price_with_currency(price, currency));
    };

    let converted = converter.convert_to_all(price, from).await;
    let parts: Vec<String> = converted
        .iter()
        .map(|(c, value)| format_price_with_currency(*value, c.code()))
        .collect();
    format!("Price: {}", parts.join(" | "))
}

fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::source::RateSource;
    use crate::providers::HardcodedSource;
    use crate::store::RateStorage;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    #[test]
    fn test_format_price_with_currency() {
        assert_eq!(format_price_with_currency(45000.0, "KZT"), "45,000 ₸");
        assert_eq!(format_price_with_currency(1234567.891, "RUB"), "1,234,567.89 ₽");
        assert_eq!(format_price_with_currency(1500.5, "USD"), "1,500.5 $");
        assert_eq!(format_price_with_currency(0.004, "USD"), "0 $");
        assert_eq!(format_price_with_currency(999.999, "EUR"), "1,000 EUR");
        assert_eq!(format_price_with_currency(-12.3, "usd"), "-12.3 $");
    }

    #[tokio::test]
    async fn test_format_price() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap(),
        ));
        let sources: Vec<Box<dyn RateSource>> = vec![Box::new(HardcodedSource)];
        let converter = CurrencyConverter::new(sources, RateStorage::in_memory(), clock);

        assert_eq!(
            format_price(&converter, 100.0, "USD").await,
            "Price: 45,000 ₸ | 9,000 ₽ | 100 $"
        );
        assert_eq!(
            format_price(&converter, 250.0, "EUR").await,
            "Price: 250 EUR"
        );
    }
}
