// src/utils/retry.rs

//! Retry policy for the HTTP transport.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Statuses that are retried automatically.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Longest single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Exponential backoff with a fixed retry budget.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Delay before retry number `attempt` (1-based): `factor * 2^(attempt-1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        if !secs.is_finite() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(secs).min(MAX_BACKOFF)
    }

    /// Sleep before retry `attempt`, preferring the server's `Retry-After`.
    pub fn wait(&self, attempt: u32, headers: Option<&HeaderMap>) -> Duration {
        headers
            .and_then(retry_after)
            .unwrap_or_else(|| self.delay(attempt))
            .min(MAX_BACKOFF)
    }

    pub fn is_retryable_status(status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status.as_u16())
    }

    pub fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }
}

/// Server-specified retry delay from a `Retry-After` header.
///
/// Accepts delta-seconds and HTTP-dates; dates in the past yield zero.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    let wait = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    Some(wait)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_exponential_growth() {
        let policy = RetryPolicy::new(3, 0.5);
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_secs(1));
        assert_eq!(policy.delay(3), Duration::from_secs(2));
    }

    #[test]
    fn test_max_cap() {
        let policy = RetryPolicy::new(50, 10.0);
        assert_eq!(policy.delay(40), MAX_BACKOFF);
    }

    #[test]
    fn test_zero_factor_never_sleeps() {
        let policy = RetryPolicy::new(3, 0.0);
        assert_eq!(policy.delay(1), Duration::ZERO);
        assert_eq!(policy.delay(5), Duration::ZERO);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(RetryPolicy::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_IMPLEMENTED));
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_wait_prefers_retry_after() {
        let policy = RetryPolicy::new(3, 0.5);
        let mut headers = HeaderMap::new();
        assert_eq!(policy.wait(2, Some(&headers)), Duration::from_secs(1));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(policy.wait(2, Some(&headers)), Duration::from_secs(3));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("86400"));
        assert_eq!(policy.wait(1, Some(&headers)), MAX_BACKOFF);
        assert_eq!(policy.wait(1, None), Duration::from_millis(500));
    }

    #[test]
    fn test_retry_after_past_date() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), Some(Duration::ZERO));
    }
}
