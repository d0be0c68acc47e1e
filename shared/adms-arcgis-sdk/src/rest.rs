//! REST transport
//!
//! ArcGIS answers most failures with HTTP 200 and an `error` object in the
//! body, so every response goes through [`decode_body`] before callers see it.

use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ArcGisError, Result};
use crate::retry::RetryPolicy;

/// Token expired / token required
const INVALID_TOKEN_CODES: [i64; 2] = [498, 499];

/// Shared HTTP client with retry for idempotent calls
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    retry: RetryPolicy,
}

impl RestClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, retry })
    }

    /// GET with query parameters; retried on transient failures
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        self.execute(Method::GET, url, params, true).await
    }

    /// Form POST; only retried when the caller marks it idempotent
    pub async fn post_form(
        &self,
        url: &str,
        params: &[(&str, String)],
        idempotent: bool,
    ) -> Result<Value> {
        self.execute(Method::POST, url, params, idempotent).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
        retry: bool,
    ) -> Result<Value> {
        let attempts = if retry { self.retry.maximum_attempts.max(1) } else { 1 };
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.send_once(method.clone(), url, params).await {
                Err(e) if attempt < attempts && e.is_retryable() => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient ArcGIS failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once(&self, method: Method, url: &str, params: &[(&str, String)]) -> Result<Value> {
        debug!(method = %method, url = %url, "Sending ArcGIS request");

        let request = if method == Method::GET {
            self.http.get(url).query(params)
        } else {
            self.http.request(method, url).form(params)
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        decode_body(status, &body)
    }
}

/// Turn a raw response into JSON, surfacing embedded API errors.
pub(crate) fn decode_body(status: u16, body: &str) -> Result<Value> {
    if !(200..300).contains(&status) {
        return Err(ArcGisError::Status {
            status,
            body: body.chars().take(512).collect(),
        });
    }

    let value: Value = serde_json::from_str(body)?;

    if let Some(error) = value.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let details = error
            .get("details")
            .and_then(Value::as_array)
            .map(|d| d.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        if INVALID_TOKEN_CODES.contains(&code) {
            return Err(ArcGisError::Unauthorized(message));
        }
        return Err(ArcGisError::Api {
            code,
            message,
            details,
        });
    }

    Ok(value)
}

/// Fail when an admin operation reports `"success": false`.
pub(crate) fn ensure_success(value: &Value, operation: &str) -> Result<()> {
    match value.get("success").and_then(Value::as_bool) {
        Some(false) => Err(ArcGisError::OperationFailed(format!(
            "{} reported failure: {}",
            operation, value
        ))),
        _ => Ok(()),
    }
}
