// src/pipeline/classify.rs

//! OK/NG classification of verification outcomes.
//!
//! The base rule looks only at the outcome. Two overlays can then turn an
//! OK into NG: a blocked destination domain, and a destination that
//! escaped to another blog platform.

use chrono::{DateTime, Utc};

use crate::models::{CheckOutcome, CheckResult, ClassifiedRecord, OutcomeKind, PolicyConfig};
use crate::utils::host_of;

/// Reason given to pages whose marker had no qualifying link.
pub const PRESENT_EMPTY_REASON: &str = "no qualifying disclosure link found";

/// Where a checked link was found.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Report label: blog root URL or spreadsheet link
    pub origin: &'a str,
    /// URL whose host counts as "home" for the platform escape rule
    pub origin_url: &'a str,
    /// Page the link was found on
    pub page_url: &'a str,
}

/// Destination URL contains a platform token but left the origin host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEscape {
    token: String,
}

impl PlatformEscape {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    fn violation(&self, final_url: &str, origin_url: &str) -> Option<String> {
        if self.token.is_empty() || !final_url.contains(&self.token) {
            return None;
        }
        let final_host = host_of(final_url);
        if final_host.is_some() && final_host == host_of(origin_url) {
            return None;
        }
        Some(format!("link destination URL contains '{}'", self.token))
    }
}

/// Classification policy built once per run.
#[derive(Debug, Clone)]
pub struct Policy {
    blocked_domains: Vec<String>,
    platform_escape: Option<PlatformEscape>,
}

impl Policy {
    pub fn new(config: &PolicyConfig) -> Self {
        let escape = &config.platform_escape;
        Self {
            blocked_domains: config
                .blocked_domains
                .iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            platform_escape: escape
                .enabled
                .then(|| PlatformEscape::new(escape.token.clone())),
        }
    }

    /// Classify one outcome relative to the URL it was found under.
    pub fn classify(&self, outcome: &CheckOutcome, origin_url: &str) -> (CheckResult, Option<String>) {
        let base_ok = match &outcome.kind {
            OutcomeKind::Success {
                status,
                keyword_hit: None,
                ..
            } => (200..400).contains(status),
            _ => false,
        };
        if !base_ok {
            let reason = outcome.error_message().or_else(|| {
                outcome
                    .status()
                    .map(|status| format!("status code {status}"))
            });
            return (CheckResult::Ng, reason);
        }

        let final_url = outcome.final_url();
        if let Some(host) = host_of(final_url).filter(|h| self.blocked_domains.contains(h)) {
            return (
                CheckResult::Ng,
                Some(format!("link destination domain is '{host}'")),
            );
        }

        if let Some(reason) = self
            .platform_escape
            .as_ref()
            .and_then(|rule| rule.violation(final_url, origin_url))
        {
            return (CheckResult::Ng, Some(reason));
        }

        (CheckResult::Ok, None)
    }

    /// Build the report row for a verified link.
    pub fn record(
        &self,
        outcome: &CheckOutcome,
        context: CheckContext<'_>,
        timestamp: DateTime<Utc>,
    ) -> ClassifiedRecord {
        let (result, reason) = self.classify(outcome, context.origin_url);
        ClassifiedRecord {
            origin: context.origin.to_string(),
            page_url: context.page_url.to_string(),
            checked_link: outcome.requested_url.clone(),
            result,
            status_code: outcome.status(),
            final_url: outcome.final_url().to_string(),
            reason,
            timestamp,
        }
    }

    /// Report row for a page with a marker but no usable link.
    pub fn present_empty(&self, context: CheckContext<'_>, timestamp: DateTime<Utc>) -> ClassifiedRecord {
        ClassifiedRecord {
            origin: context.origin.to_string(),
            page_url: context.page_url.to_string(),
            checked_link: context.page_url.to_string(),
            result: CheckResult::Ng,
            status_code: None,
            final_url: context.page_url.to_string(),
            reason: Some(PRESENT_EMPTY_REASON.to_string()),
            timestamp,
        }
    }
}
