//! Shared HTTP retry wrapper with 429/5xx handling and Retry-After support.
//!
//! `send_with_retry()` is a drop-in replacement for `request.send()`:
//! exponential backoff with jitter on 429 (Too Many Requests) and 5xx,
//! Retry-After header parsing (numeric seconds), transparent passthrough
//! for every other status.

use reqwest::{Client, Request, Response};
use std::time::Duration;

/// Retry behavior knobs.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 15_000,
        }
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Parse a numeric Retry-After header value. HTTP-date values are ignored;
/// numeric seconds cover the overwhelming majority of real responses.
fn parse_retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get("retry-after")?.to_str().ok()?;
    let secs = value.parse::<u64>().ok()?;
    Some(Duration::from_secs(secs.min(120)))
}

fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base = config.base_delay_ms as f64 * 2f64.powi(attempt as i32);
    let capped = base.min(config.max_delay_ms as f64);
    // 10-30% jitter so concurrent clients don't retry in lockstep
    let jitter = capped * (0.1 + rand::random::<f64>() * 0.2);
    Duration::from_millis((capped + jitter) as u64)
}

/// Send a request, retrying on 429/5xx. The request parts are captured up
/// front and rebuilt for each attempt.
pub async fn send_with_retry(
    client: &Client,
    request: Request,
    config: &RetryConfig,
) -> Result<Response, reqwest::Error> {
    let method = request.method().clone();
    let url = request.url().clone();
    let headers = request.headers().clone();
    let body_bytes = request
        .body()
        .and_then(|b| b.as_bytes())
        .map(|b| b.to_vec());

    let mut last_response = client.execute(request).await?;

    for attempt in 0..config.max_retries {
        if !is_retryable_status(last_response.status().as_u16()) {
            return Ok(last_response);
        }

        let delay = parse_retry_after(&last_response)
            .unwrap_or_else(|| backoff_delay(attempt, config));
        tracing::debug!(
            "{} {} returned {}; retry {}/{} after {:?}",
            method,
            url,
            last_response.status(),
            attempt + 1,
            config.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;

        let mut retry_req = client.request(method.clone(), url.clone());
        for (key, value) in headers.iter() {
            retry_req = retry_req.header(key, value);
        }
        if let Some(ref body) = body_bytes {
            retry_req = retry_req.body(body.clone());
        }
        last_response = retry_req.send().await?;
    }

    Ok(last_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(409));
    }

    #[test]
    fn test_backoff_delay_bounded() {
        let config = RetryConfig::default();
        for attempt in 0..10 {
            let delay = backoff_delay(attempt, &config);
            assert!(delay.as_millis() <= (config.max_delay_ms as u128 * 2));
        }
    }
}
