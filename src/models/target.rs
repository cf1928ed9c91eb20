//! Crawl targets and transient page data.

use crate::services::Platform;

/// A blog root to crawl, with its platform derived from the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub platform: Platform,
}

impl Target {
    /// Build a target by detecting the platform from the URL host.
    ///
    /// Returns `None` when the URL has no usable host.
    pub fn detect(url: &str) -> Option<Self> {
        let url = url.trim();
        Platform::detect(url).map(|platform| Self {
            url: url.to_string(),
            platform,
        })
    }

    /// Build a target with an explicit platform.
    pub fn with_platform(url: impl Into<String>, platform: Platform) -> Self {
        Self {
            url: url.into(),
            platform,
        }
    }
}

/// A fetched page. Lives only for one crawl step.
#[derive(Debug, Clone)]
pub struct PageFetch {
    /// Requested page URL
    pub url: String,
    /// Decoded response body
    pub body: String,
    /// Charset label the body was decoded with
    pub encoding: String,
}

/// A candidate link found after a disclosure marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub source_page: String,
    pub candidate: String,
}
