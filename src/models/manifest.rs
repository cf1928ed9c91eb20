//! Input manifest that triggers a run.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::FailureKey;

/// The manifest document delivered with the trigger event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Blog roots to crawl
    #[serde(default, alias = "latest_target_url_list")]
    pub auto_url_list: Vec<AutoTarget>,

    /// Pre-known article/link pairs, checked without crawling
    #[serde(default)]
    pub manual_url_list: Vec<ManualEntry>,

    /// NG records of the previous run
    #[serde(default)]
    pub previous_error_details: Vec<PreviousFailure>,
}

impl Manifest {
    /// Parse a manifest from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| AppError::manifest(format!("malformed manifest: {e}")))
    }

    /// Non-empty blog root URLs, in manifest order.
    pub fn auto_urls(&self) -> impl Iterator<Item = &str> {
        self.auto_url_list
            .iter()
            .filter_map(|t| t.url.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// A blog root to crawl.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoTarget {
    #[serde(default)]
    pub url: Option<String>,
}

/// A link checked directly against a known article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualEntry {
    /// Label identifying where the entry came from
    #[serde(default)]
    pub spreadsheet_link: String,

    #[serde(default)]
    pub blog_article_url: String,

    #[serde(default)]
    pub affiliate_link: String,
}

impl ManualEntry {
    pub fn is_complete(&self) -> bool {
        !self.blog_article_url.trim().is_empty() && !self.affiliate_link.trim().is_empty()
    }
}

/// One NG record of the previous run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousFailure {
    #[serde(default)]
    pub blog_url: String,

    #[serde(alias = "blog_article_url")]
    pub page_url: String,

    #[serde(alias = "affiliate_link")]
    pub checked_link: String,

    #[serde(default, alias = "error_message")]
    pub error_reason: Option<String>,
}

impl PreviousFailure {
    pub fn failure_key(&self) -> FailureKey {
        FailureKey::new(&self.page_url, &self.checked_link)
    }
}
