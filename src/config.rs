// src/config.rs

//! Configuration loading utilities.
//!
//! The CLI reads a TOML file; the Lambda function reads environment
//! variables. Both produce a validated [`Config`].

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::models::{Config, RefreshRetry};

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate configuration from the process environment.
pub fn config_from_env() -> Result<Config> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Build configuration from an arbitrary variable lookup.
pub fn config_from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };
    let mut config = Config::default();

    config.output.bucket = env.required::<String>("S3_OUTPUT_BUCKET")?;
    if config.output.bucket.trim().is_empty() {
        return Err(AppError::config("S3_OUTPUT_BUCKET is empty"));
    }
    if let Some(key) = env.value("REPORT_KEY") {
        config.output.report_key = key;
    }
    if let Some(key) = env.value("DIFF_KEY") {
        config.output.diff_key = key;
    }
    if let Some(key) = env.value("STATUS_KEY") {
        config.output.status_key = key;
    }

    let crawler = &mut config.crawler;
    crawler.timeout_secs = env.required("REQUEST_TIMEOUT")?;
    crawler.max_retries = env.required("MAX_RETRIES")?;
    crawler.backoff_factor = env.required("BACKOFF_FACTOR")?;
    crawler.max_workers = env.required("MAX_WORKERS")?;
    crawler.page_delay_secs = env.required("CRAWL_WAIT_SECONDS")?;
    if let Some(secs) = env.optional("ARTICLE_WAIT_SECONDS")? {
        crawler.article_delay_secs = secs;
    }
    if let Some(flag) = env.flag("DELAY_AFTER_LAST_PAGE")? {
        crawler.delay_after_last_page = flag;
    }
    if let Some(flag) = env.flag("CRAWL_GENERIC")? {
        crawler.crawl_generic = flag;
    }

    let verifier = &mut config.verifier;
    verifier.ng_words = env.list("NG_WORDS");
    if let Some(hops) = env.optional("META_REFRESH_HOPS")? {
        verifier.max_meta_refresh_hops = hops;
    }
    if let Some(mode) = env.optional::<RefreshRetry>("META_REFRESH_RETRY")? {
        verifier.refresh_retry = mode;
    }

    let policy = &mut config.policy;
    policy.exclude_patterns = env.list("EXCLUDE_PATTERNS");
    if env.value("BLOCKED_DOMAINS").is_some() {
        policy.blocked_domains = env.list("BLOCKED_DOMAINS");
    }
    if let Some(flag) = env.flag("PLATFORM_ESCAPE_CHECK")? {
        policy.platform_escape.enabled = flag;
    }
    if let Some(token) = env.value("PLATFORM_ESCAPE_TOKEN") {
        policy.platform_escape.token = token;
    }

    config.notify.webhook_url = env.value("NOTIFY_WEBHOOK_URL");
    config.notify.workflow_url = env.value("WORKFLOW_URL");

    config.validate()?;
    Ok(config)
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed, non-empty value of `key`.
    fn value(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = (self.lookup)(key)
            .ok_or_else(|| AppError::config(format!("missing required environment variable {key}")))?;
        parse(key, raw.trim())
    }

    fn optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.value(key).map(|raw| parse(key, &raw)).transpose()
    }

    fn flag(&self, key: &str) -> Result<Option<bool>> {
        let Some(raw) = self.value(key) else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(AppError::config(format!(
                "invalid boolean for {key}: '{raw}'"
            ))),
        }
    }

    /// Comma-separated list with blank items removed.
    fn list(&self, key: &str) -> Vec<String> {
        self.value(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| AppError::config(format!("invalid value for {key}: '{raw}' ({e})")))
}
