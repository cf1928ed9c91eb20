//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Built once per run and shared read-only by every component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the report and secondary artifacts are written
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Link verification settings
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Classification policy settings
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Best-effort notification endpoints
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.output.report_key.trim().is_empty() {
            return Err(AppError::validation("output.report_key is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_workers == 0 {
            return Err(AppError::validation("crawler.max_workers must be > 0"));
        }
        if !self.crawler.backoff_factor.is_finite() || self.crawler.backoff_factor < 0.0 {
            return Err(AppError::validation(
                "crawler.backoff_factor must be a finite number >= 0",
            ));
        }
        if self.verifier.max_meta_refresh_hops == 0 {
            return Err(AppError::validation(
                "verifier.max_meta_refresh_hops must be > 0",
            ));
        }
        if self.policy.platform_escape.enabled && self.policy.platform_escape.token.is_empty() {
            return Err(AppError::validation(
                "policy.platform_escape.token is empty while the rule is enabled",
            ));
        }
        for endpoint in [&self.notify.webhook_url, &self.notify.workflow_url]
            .into_iter()
            .flatten()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
        {
            Url::parse(endpoint)?;
        }
        Ok(())
    }
}

/// Output locations, relative to the output bucket or directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output bucket (only used by the S3 backend)
    #[serde(default)]
    pub bucket: String,

    /// Key of the primary CSV report
    #[serde(default = "defaults::report_key")]
    pub report_key: String,

    /// Key of the new/fixed diff artifact
    #[serde(default = "defaults::diff_key")]
    pub diff_key: String,

    /// Key of the completion-status record
    #[serde(default = "defaults::status_key")]
    pub status_key: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            report_key: defaults::report_key(),
            diff_key: defaults::diff_key(),
            status_key: defaults::status_key(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Retries on retryable statuses and transport errors
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base of the exponential retry delay, in seconds
    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor: f64,

    /// Size of the link-check worker pool
    #[serde(default = "defaults::max_workers")]
    pub max_workers: usize,

    /// Delay between sequential page fetches, in seconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_secs: u64,

    /// Delay before each Livedoor article fetch, in seconds
    #[serde(default = "defaults::article_delay")]
    pub article_delay_secs: u64,

    /// Also sleep after the last page of a walk
    #[serde(default)]
    pub delay_after_last_page: bool,

    /// Crawl hosts that are neither Hatena nor Livedoor
    #[serde(default)]
    pub crawl_generic: bool,

    /// Upper bound on pages per walk (0 = unlimited)
    #[serde(default)]
    pub max_pages: usize,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_secs)
    }

    pub fn article_delay(&self) -> Duration {
        Duration::from_secs(self.article_delay_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            backoff_factor: defaults::backoff_factor(),
            max_workers: defaults::max_workers(),
            page_delay_secs: defaults::page_delay(),
            article_delay_secs: defaults::article_delay(),
            delay_after_last_page: false,
            crawl_generic: false,
            max_pages: 0,
        }
    }
}

/// How the retry budget is shared across a meta-refresh chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshRetry {
    /// Every hop gets the full retry budget
    #[default]
    PerHop,
    /// One budget for the whole chain
    Shared,
}

impl FromStr for RefreshRetry {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_hop" | "per-hop" => Ok(Self::PerHop),
            "shared" => Ok(Self::Shared),
            other => Err(AppError::config(format!(
                "unknown meta refresh retry mode '{other}' (expected per_hop or shared)"
            ))),
        }
    }
}

impl fmt::Display for RefreshRetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerHop => f.write_str("per_hop"),
            Self::Shared => f.write_str("shared"),
        }
    }
}

/// Link verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Maximum number of meta-refresh hops followed per link
    #[serde(default = "defaults::max_meta_refresh_hops")]
    pub max_meta_refresh_hops: usize,

    /// Retry budget scope for meta-refresh hops
    #[serde(default)]
    pub refresh_retry: RefreshRetry,

    /// Banned keywords searched verbatim in the final page body
    #[serde(default)]
    pub ng_words: Vec<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_meta_refresh_hops: defaults::max_meta_refresh_hops(),
            refresh_retry: RefreshRetry::default(),
            ng_words: Vec::new(),
        }
    }
}

/// Classification policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Final hosts that always classify as NG
    #[serde(default = "defaults::blocked_domains")]
    pub blocked_domains: Vec<String>,

    /// Candidate links containing any of these substrings are not checked
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Off-host platform escape rule
    #[serde(default)]
    pub platform_escape: PlatformEscapeConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            blocked_domains: defaults::blocked_domains(),
            exclude_patterns: Vec::new(),
            platform_escape: PlatformEscapeConfig::default(),
        }
    }
}

/// Settings of the platform escape rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEscapeConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Substring that flags a final URL when it lands off the origin host
    #[serde(default = "defaults::escape_token")]
    pub token: String,
}

impl Default for PlatformEscapeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token: defaults::escape_token(),
        }
    }
}

/// Best-effort notification endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Incoming webhook receiving the human-readable summary
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Workflow endpoint receiving the report location
    #[serde(default)]
    pub workflow_url: Option<String>,
}

mod defaults {
    // Output defaults
    pub fn report_key() -> String {
        "results/linkcheck_result.csv".into()
    }
    pub fn diff_key() -> String {
        "results/linkcheck_diff.json".into()
    }
    pub fn status_key() -> String {
        "status/last_success.json".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn backoff_factor() -> f64 {
        0.5
    }
    pub fn max_workers() -> usize {
        5
    }
    pub fn page_delay() -> u64 {
        1
    }
    pub fn article_delay() -> u64 {
        1
    }

    // Verifier defaults
    pub fn max_meta_refresh_hops() -> usize {
        5
    }

    // Policy defaults
    pub fn blocked_domains() -> Vec<String> {
        vec!["jass-net.com".into()]
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn escape_token() -> String {
        "hatena".into()
    }
}
