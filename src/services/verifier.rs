// src/services/verifier.rs

//! Link verification over HTTP.
//!
//! One shared client, status and transport retries with exponential
//! backoff, and bounded meta-refresh following.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, Response};
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CheckOutcome, Config, OutcomeKind, PageFetch, RefreshRetry};
use crate::utils::http::{charset_of, create_async_client, decode_body};
use crate::utils::retry::RetryPolicy;
use crate::utils::url::resolve;

static META_REFRESH: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[http-equiv][content]").expect("static selector is valid")
});

static REFRESH_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\s*=\s*(.+)").expect("static regex is valid"));

/// Retries left for the current request or refresh chain.
#[derive(Debug)]
struct RetryBudget {
    remaining: u32,
    used: u32,
}

impl RetryBudget {
    fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries,
            used: 0,
        }
    }

    /// Take one retry, returning its 1-based attempt number.
    fn take(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.used += 1;
        Some(self.used)
    }
}

/// Resolves links to a terminal [`CheckOutcome`].
#[derive(Debug, Clone)]
pub struct LinkVerifier {
    client: Client,
    retry: RetryPolicy,
    max_hops: usize,
    refresh_retry: RefreshRetry,
    ng_words: Vec<String>,
}

impl LinkVerifier {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            retry: RetryPolicy::new(config.crawler.max_retries, config.crawler.backoff_factor),
            max_hops: config.verifier.max_meta_refresh_hops,
            refresh_retry: config.verifier.refresh_retry,
            ng_words: config
                .verifier
                .ng_words
                .iter()
                .filter(|w| !w.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Build a verifier with its own client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.crawler)?;
        Ok(Self::new(client, config))
    }

    /// Fetch `url`, follow meta refreshes and classify what was reached.
    pub async fn check(&self, url: &str) -> CheckOutcome {
        let mut budget = RetryBudget::new(self.retry.max_retries);
        let mut current = url.to_string();
        let mut hops = 0usize;

        loop {
            if self.refresh_retry == RefreshRetry::PerHop {
                budget = RetryBudget::new(self.retry.max_retries);
            }

            let response = match self.send_with_retry(&current, &mut budget).await {
                Ok(response) => response,
                Err(e) => {
                    log::debug!("Transport failure for {current}: {e}");
                    return CheckOutcome::new(
                        url,
                        OutcomeKind::TransportError {
                            final_url: current,
                            message: e.to_string(),
                        },
                    );
                }
            };

            let status = response.status();
            let final_url = response.url().clone();
            if status.is_client_error() || status.is_server_error() {
                let message = format!(
                    "{} {} for url: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown"),
                    final_url
                );
                return CheckOutcome::new(
                    url,
                    OutcomeKind::HttpError {
                        status: status.as_u16(),
                        final_url: final_url.to_string(),
                        message,
                    },
                );
            }

            let declared = charset_of(response.headers());
            let body = match response.bytes().await {
                Ok(bytes) => decode_body(declared.as_deref(), &bytes).0,
                Err(e) => {
                    return CheckOutcome::new(
                        url,
                        OutcomeKind::TransportError {
                            final_url: final_url.to_string(),
                            message: e.to_string(),
                        },
                    );
                }
            };

            match find_meta_refresh(&body, &final_url) {
                Some(next) if hops >= self.max_hops => {
                    log::debug!("Meta refresh limit reached at {final_url} -> {next}");
                    return CheckOutcome::new(
                        url,
                        OutcomeKind::RedirectLimitExceeded { final_url: next },
                    );
                }
                Some(next) => {
                    hops += 1;
                    log::debug!("Meta refresh {hops}: {final_url} -> {next}");
                    current = next;
                }
                None => {
                    let keyword_hit = self
                        .ng_words
                        .iter()
                        .find(|word| body.contains(word.as_str()))
                        .cloned();
                    return CheckOutcome::new(
                        url,
                        OutcomeKind::Success {
                            status: status.as_u16(),
                            final_url: final_url.to_string(),
                            keyword_hit,
                        },
                    );
                }
            }
        }
    }

    /// Fetch a blog page for crawling.
    ///
    /// Uses the same retries as [`check`](Self::check) but never follows
    /// meta refreshes. Any status >= 400 is an error.
    pub async fn fetch_page(&self, url: &str) -> Result<PageFetch> {
        let mut budget = RetryBudget::new(self.retry.max_retries);
        let response = self
            .send_with_retry(url, &mut budget)
            .await
            .map_err(|e| AppError::crawl(url, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(AppError::crawl(url, format!("HTTP {status}")));
        }

        let declared = charset_of(response.headers());
        let bytes = response.bytes().await.map_err(|e| AppError::crawl(url, e))?;
        let (body, encoding) = decode_body(declared.as_deref(), &bytes);
        log::debug!("Decoded {url} as {encoding}");
        Ok(PageFetch {
            url: url.to_string(),
            body,
            encoding,
        })
    }

    /// GET with retries on retryable statuses and transport errors.
    ///
    /// A retryable status that outlives the budget is returned as is.
    async fn send_with_retry(
        &self,
        url: &str,
        budget: &mut RetryBudget,
    ) -> std::result::Result<Response, reqwest::Error> {
        loop {
            match self.client.get(url).send().await {
                Ok(response) if RetryPolicy::is_retryable_status(response.status()) => {
                    let Some(attempt) = budget.take() else {
                        return Ok(response);
                    };
                    let wait = self.retry.wait(attempt, Some(response.headers()));
                    let status = response.status().as_u16();
                    drop(response);
                    log::debug!("HTTP {status} from {url}, retry {attempt} in {wait:?}");
                    tokio::time::sleep(wait).await;
                }
                Ok(response) => return Ok(response),
                Err(e) if RetryPolicy::is_retryable_error(&e) => {
                    let Some(attempt) = budget.take() else {
                        return Err(e);
                    };
                    let wait = self.retry.wait(attempt, None);
                    log::debug!("Request to {url} failed ({e}), retry {attempt} in {wait:?}");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Absolute target of the first meta-refresh tag in `body`, if any.
pub fn find_meta_refresh(body: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(body);
    let meta = document.select(&META_REFRESH).find(|m| {
        m.value()
            .attr("http-equiv")
            .is_some_and(|v| v.to_ascii_lowercase().contains("refresh"))
    })?;
    let content = meta.value().attr("content")?;
    let target = REFRESH_URL
        .captures(content)?
        .get(1)?
        .as_str()
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim();
    if target.is_empty() {
        return None;
    }
    resolve(base, target).map(|u| u.to_string())
}
