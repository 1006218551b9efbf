use crate::core::config::HttpConfig;
use crate::core::error::RateError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error after all attempts
pub async fn with_retry<F, Fut, T, E>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Shared HTTP client with the timeout and retry settings applied to every call.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fxrate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            retries: config.retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// Wraps an already configured client; requests are attempted once.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            retries: 0,
            retry_delay_ms: 0,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RateError> {
        debug!("Requesting {}", url);
        let response = with_retry(
            || self.client.get(url).send(),
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(|source| RateError::NetworkFailure {
            url: url.to_string(),
            source,
        })?;
        read_json(url, response).await
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, RateError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!("Posting to {}", url);
        let response = with_retry(
            || self.client.post(url).json(body).send(),
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(|source| RateError::NetworkFailure {
            url: url.to_string(),
            source,
        })?;
        read_json(url, response).await
    }
}

async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, RateError> {
    let status = response.status();
    if !status.is_success() {
        return Err(RateError::InvalidResponse {
            url: url.to_string(),
            reason: format!("HTTP error: {status}"),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|source| RateError::NetworkFailure {
            url: url.to_string(),
            source,
        })?;

    // Check for empty or non-JSON responses before parsing
    if text.trim().is_empty() {
        return Err(RateError::InvalidResponse {
            url: url.to_string(),
            reason: "empty response".to_string(),
        });
    }

    serde_json::from_str(&text).map_err(|e| RateError::InvalidResponse {
        url: url.to_string(),
        reason: format!("Failed to parse JSON response: {e}"),
    })
}
