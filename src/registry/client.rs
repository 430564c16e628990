//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry logic for transient failures
//! - `Retry-After` handling for 429/503 responses, with zero values raised
//!   to a configured floor (the release history service is known to send
//!   `Retry-After: 0`)

use crate::config::HttpConfig;
use crate::error::RegistryError;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Base delay for exponential backoff
const BASE_DELAY: Duration = Duration::from_millis(100);

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    min_retry_after: Duration,
}

impl HttpClient {
    /// Create a client from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            min_retry_after: config.min_retry_after(),
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the floor applied to zero or unreadable `Retry-After` values
    pub fn with_min_retry_after(mut self, min_retry_after: Duration) -> Self {
        self.min_retry_after = min_retry_after;
        self
    }

    /// Perform a GET request with retry logic and error context
    ///
    /// `resource` and `source_name` only feed error messages.
    pub async fn get(
        &self,
        url: &str,
        accept: &str,
        resource: &str,
        source_name: &str,
    ) -> Result<Response, RegistryError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY;

        for attempt in 0..=self.max_retries {
            let can_retry = attempt < self.max_retries;
            match self.client.get(url).header(ACCEPT, accept).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        let header = response
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok());
                        let wait = match header {
                            Some(value) => effective_retry_after(value, self.min_retry_after),
                            None => delay,
                        };
                        last_error = Some(RegistryError::RateLimited {
                            source_name: source_name.to_string(),
                            retry_after_secs: wait.as_secs(),
                        });
                        if can_retry {
                            debug!(url, attempt, wait_ms = wait.as_millis() as u64, "rate limited, waiting");
                            tokio::time::sleep(wait).await;
                            delay *= 2;
                            continue;
                        }
                        break;
                    }

                    if status == StatusCode::NOT_FOUND {
                        return Err(RegistryError::not_found(resource, source_name));
                    }

                    if !status.is_success() {
                        let error = RegistryError::Http {
                            resource: resource.to_string(),
                            source_name: source_name.to_string(),
                            status: status.as_u16(),
                        };
                        if error.is_transient() && can_retry {
                            last_error = Some(error);
                            tokio::time::sleep(delay).await;
                            delay *= 2;
                            continue;
                        }
                        return Err(error);
                    }

                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        RegistryError::timeout(resource, source_name)
                    } else {
                        RegistryError::network(resource, source_name, e.to_string())
                    });

                    if can_retry {
                        debug!(url, attempt, error = %e, "request failed, retrying");
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RegistryError::network(resource, source_name, "unknown error")))
    }

    /// Perform a GET request and return the body as text
    pub async fn get_text(
        &self,
        url: &str,
        accept: &str,
        resource: &str,
        source_name: &str,
    ) -> Result<String, RegistryError> {
        let response = self.get(url, accept, resource, source_name).await?;
        response.text().await.map_err(|e| {
            RegistryError::invalid_response(
                resource,
                source_name,
                format!("failed to read response body: {}", e),
            )
        })
    }

    /// Perform a GET request and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        resource: &str,
        source_name: &str,
    ) -> Result<T, RegistryError> {
        let response = self
            .get(url, "application/json", resource, source_name)
            .await?;
        response.json::<T>().await.map_err(|e| {
            RegistryError::invalid_response(
                resource,
                source_name,
                format!("failed to parse JSON: {}", e),
            )
        })
    }
}

/// Resolve the wait requested by a `Retry-After` header
///
/// Values that are zero or not a number of seconds fall back to `floor`.
pub fn effective_retry_after(header: &str, floor: Duration) -> Duration {
    match header.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => floor,
    }
}
