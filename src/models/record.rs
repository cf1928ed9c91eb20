//! Classified report rows and failure identities.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Policy classification of a checked link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckResult {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NG")]
    Ng,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Ng => f.write_str("NG"),
        }
    }
}

/// Identity of a failure across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FailureKey {
    pub page_url: String,
    pub checked_link: String,
}

impl FailureKey {
    pub fn new(page_url: impl Into<String>, checked_link: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            checked_link: checked_link.into(),
        }
    }
}

/// One report row. Field order is the report column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// Blog root URL or spreadsheet label the link came from
    #[serde(rename = "blog_url")]
    pub origin: String,

    /// Page or article the link was found on
    pub page_url: String,

    /// Link that was checked
    pub checked_link: String,

    #[serde(rename = "status")]
    pub result: CheckResult,

    pub status_code: Option<u16>,

    /// URL reached after transport redirects and meta-refresh hops
    pub final_url: String,

    #[serde(rename = "error_message")]
    pub reason: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl ClassifiedRecord {
    pub fn is_ng(&self) -> bool {
        self.result == CheckResult::Ng
    }

    pub fn failure_key(&self) -> FailureKey {
        FailureKey::new(&self.page_url, &self.checked_link)
    }

    /// Ordering key of report rows.
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (&self.origin, &self.page_url, &self.checked_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(result: CheckResult) -> ClassifiedRecord {
        ClassifiedRecord {
            origin: "https://foo.hatenablog.com/".into(),
            page_url: "https://foo.hatenablog.com/entry/1".into(),
            checked_link: "https://shop.example/aff?id=1".into(),
            result,
            status_code: Some(200),
            final_url: "https://shop.example/aff?id=1".into(),
            reason: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_failure_key() {
        let record = sample(CheckResult::Ng);
        assert!(record.is_ng());
        assert_eq!(
            record.failure_key(),
            FailureKey::new(
                "https://foo.hatenablog.com/entry/1",
                "https://shop.example/aff?id=1"
            )
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(sample(CheckResult::Ok)).unwrap();
        assert_eq!(value["blog_url"], "https://foo.hatenablog.com/");
        assert_eq!(value["status"], "OK");
        assert_eq!(value["status_code"], 200);
        assert!(value["error_message"].is_null());
    }
}
