use chrono::{Duration, Utc};
use fxrate::converter::CurrencyConverter;
use fxrate::core::config::AppConfig;
use fxrate::core::currency::{Currency, ExchangeRateTable, RateCacheEntry};
use fxrate::store::{KeyValueStore, RateStorage};
use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_primary_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub async fn create_backend_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/exchange-rates/"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub const PRIMARY_OK: &str = r#"{
        "success": true,
        "base": "USD",
        "date": "2026-10-14",
        "rates": { "KZT": 480.0, "RUB": 80.0, "USD": 1.0 }
    }"#;

    pub const BACKEND_OK: &str =
        r#"{"success": true, "rates": {"KZT": 470.0, "RUB": 85.0, "USD": 1.0}}"#;
}

fn config_for(primary: &str, backend: &str, data_dir: &std::path::Path) -> AppConfig {
    let yaml = format!(
        r#"
providers:
  primary:
    base_url: "{primary}"
  backend:
    base_url: "{backend}"
http:
  timeout_secs: 5
  retries: 0
data_path: "{}"
"#,
        data_dir.display()
    );
    serde_yaml::from_str(&yaml).expect("Failed to parse test config")
}

fn table(kzt: f64, rub: f64) -> ExchangeRateTable {
    [(Currency::Kzt, kzt), (Currency::Rub, rub), (Currency::Usd, 1.0)]
        .into_iter()
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_primary_rates_are_used_and_persisted() {
    let primary = test_utils::create_primary_mock_server(200, test_utils::PRIMARY_OK).await;
    let backend = test_utils::create_backend_mock_server(200, test_utils::BACKEND_OK).await;
    let data_dir = tempfile::tempdir().unwrap();
    let config = config_for(&primary.uri(), &backend.uri(), data_dir.path());

    let store = KeyValueStore::open(data_dir.path()).unwrap();
    let storage = RateStorage::from_store(&store).unwrap();
    let converter = CurrencyConverter::from_config(&config, storage.clone()).unwrap();

    assert_eq!(converter.convert(100.0, "USD", "KZT").await, 48000.0);
    assert_eq!(converter.convert(800.0, "RUB", "KZT").await, 4800.0);
    assert!(converter.are_rates_fresh());

    let stored = storage.load().unwrap().expect("rates should be persisted");
    assert_eq!(stored.rates, table(480.0, 80.0));
    assert_eq!(stored.base, Currency::Usd);
    info!(?stored, "Persisted entry");
}

#[test_log::test(tokio::test)]
async fn test_backend_used_when_primary_fails() {
    let primary = test_utils::create_primary_mock_server(503, "").await;
    let backend = test_utils::create_backend_mock_server(200, test_utils::BACKEND_OK).await;
    let data_dir = tempfile::tempdir().unwrap();
    let config = config_for(&primary.uri(), &backend.uri(), data_dir.path());

    let storage = RateStorage::in_memory();
    let converter = CurrencyConverter::from_config(&config, storage.clone()).unwrap();

    let rates = converter.get_exchange_rates().await;
    assert_eq!(rates, table(470.0, 85.0));
    // only the primary provider writes through to storage
    assert!(storage.load().unwrap().is_none());
}

#[test_log::test(tokio::test)]
async fn test_backend_rates_follow_requested_pivot() {
    let primary = test_utils::create_primary_mock_server(500, "").await;
    let backend = test_utils::create_backend_mock_server(200, test_utils::BACKEND_OK).await;
    let data_dir = tempfile::tempdir().unwrap();
    let config = config_for(&primary.uri(), &backend.uri(), data_dir.path());
    let converter = CurrencyConverter::from_config(&config, RateStorage::in_memory()).unwrap();

    let rates = converter.refresh_rates(Currency::Kzt).await;
    assert_eq!(converter.cached_base(), Some(Currency::Kzt));
    assert_eq!(rates.get(Currency::Kzt), Some(1.0));
    assert_eq!(converter.convert(100.0, "USD", "KZT").await, 47000.0);
    assert_eq!(converter.convert(8500.0, "RUB", "KZT").await, 47000.0);
}

#[test_log::test(tokio::test)]
async fn test_recent_stored_rates_used_when_network_fails() {
    let primary = test_utils::create_primary_mock_server(500, "").await;
    let backend = test_utils::create_backend_mock_server(500, "").await;
    let data_dir = tempfile::tempdir().unwrap();
    let config = config_for(&primary.uri(), &backend.uri(), data_dir.path());

    let storage = RateStorage::in_memory();
    let fetched = Utc::now() - Duration::hours(5);
    storage
        .save(&RateCacheEntry::new(table(500.0, 95.0), fetched, Currency::Usd))
        .unwrap();
    let converter = CurrencyConverter::from_config(&config, storage).unwrap();

    assert_eq!(converter.get_exchange_rates().await, table(500.0, 95.0));
    let info = converter.get_cache_info();
    assert!(info.has_rates);
    assert_eq!(info.last_fetch_ms, fetched.timestamp_millis());
    assert!(converter.are_rates_fresh());
}

#[test_log::test(tokio::test)]
async fn test_stale_stored_rates_replaced_by_fallback() {
    let primary = test_utils::create_primary_mock_server(500, "").await;
    let backend = test_utils::create_backend_mock_server(200, r#"{"success": false}"#).await;
    let data_dir = tempfile::tempdir().unwrap();
    let config = config_for(&primary.uri(), &backend.uri(), data_dir.path());

    let storage = RateStorage::in_memory();
    storage
        .save(&RateCacheEntry::new(
            table(500.0, 95.0),
            Utc::now() - Duration::hours(13),
            Currency::Usd,
        ))
        .unwrap();
    let converter = CurrencyConverter::from_config(&config, storage).unwrap();

    assert_eq!(converter.get_exchange_rates().await, table(450.0, 90.0));
    assert_eq!(converter.convert(1000.0, "RUB", "KZT").await, 5000.0);
}

#[test_log::test(tokio::test)]
async fn test_concurrent_requests_fetch_independently() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(test_utils::PRIMARY_OK)
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .expect(2)
        .mount(&primary)
        .await;
    let data_dir = tempfile::tempdir().unwrap();
    let config = config_for(&primary.uri(), "http://127.0.0.1:1", data_dir.path());
    let converter = CurrencyConverter::from_config(&config, RateStorage::in_memory()).unwrap();

    let results = futures::future::join_all([
        converter.get_exchange_rates(),
        converter.get_exchange_rates(),
    ])
    .await;
    assert!(results.iter().all(|r| *r == table(480.0, 80.0)));
    primary.verify().await;
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let primary = test_utils::create_primary_mock_server(200, test_utils::PRIMARY_OK).await;
    let backend = test_utils::create_backend_mock_server(200, test_utils::BACKEND_OK).await;
    let data_dir = tempfile::tempdir().unwrap();

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
providers:
  primary:
    base_url: "{}"
  backend:
    base_url: "{}"
http:
  retries: 0
data_path: "{}"
"#,
        primary.uri(),
        backend.uri(),
        data_dir.path().display()
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");
    let config_path = config_file.path().to_str().unwrap();

    for command in [
        fxrate::AppCommand::Rates,
        fxrate::AppCommand::Convert {
            amount: 100.0,
            from: "USD".to_string(),
            to: "KZT".to_string(),
            remote: false,
        },
        fxrate::AppCommand::Price {
            amount: 2500.0,
            currency: "KZT".to_string(),
        },
        fxrate::AppCommand::Refresh {
            base: Currency::Usd,
        },
    ] {
        let result = fxrate::run_command(command.clone(), Some(config_path)).await;
        assert!(
            result.is_ok(),
            "{command:?} failed with: {:?}",
            result.err()
        );
    }

    let stored = {
        let store = KeyValueStore::open(data_dir.path()).unwrap();
        RateStorage::from_store(&store).unwrap().load().unwrap()
    };
    let stored = stored.expect("refresh should persist primary rates");
    assert_eq!(stored.rates, table(480.0, 80.0));
    assert_eq!(stored.base, Currency::Usd);

    fxrate::run_command(fxrate::AppCommand::Clear, Some(config_path))
        .await
        .unwrap();

    let store = KeyValueStore::open(data_dir.path()).unwrap();
    let storage = RateStorage::from_store(&store).unwrap();
    assert!(storage.load().unwrap().is_none());
}

#[test_log::test(tokio::test)]
async fn test_remote_conversion_command() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/convert-price/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "success": false,
                "original_amount": 10.0,
                "original_currency": "USD",
                "converted_amount": 0.0,
                "target_currency": "EUR",
                "error": "Unsupported currency"
            }"#,
        ))
        .mount(&backend)
        .await;
    let data_dir = tempfile::tempdir().unwrap();

    let config_file = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        config_file.path(),
        format!(
            "providers:\n  backend:\n    base_url: \"{}\"\ndata_path: \"{}\"\n",
            backend.uri(),
            data_dir.path().display()
        ),
    )
    .unwrap();

    let result = fxrate::run_command(
        fxrate::AppCommand::Convert {
            amount: 10.0,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            remote: true,
        },
        config_file.path().to_str(),
    )
    .await;
    let err = result.expect_err("server rejection should surface");
    assert!(err.to_string().contains("Unsupported currency"));
}
