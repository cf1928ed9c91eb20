// src/services/crawler.rs

//! Paginated blog walking.
//!
//! Each target is walked as a small state machine over its pages. Hatena
//! and generic pages are handed to a [`PageVisitor`] as they are fetched;
//! Livedoor list pages only contribute article URLs, which are fetched and
//! visited once pagination ends.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::error::AppError;
use crate::models::{ClassifiedRecord, CrawlerConfig, PageFetch, Target};
use crate::services::extractor::{Extraction, extract_ad_links, extract_from_document};
use crate::services::{LinkVerifier, Platform};

/// Receives the extraction of every scanned page.
#[async_trait]
pub trait PageVisitor: Send + Sync {
    async fn visit(
        &self,
        target: &Target,
        page_url: &str,
        extraction: Extraction,
    ) -> Vec<ClassifiedRecord>;
}

/// Everything a page yields, computed before the parsed document is dropped.
#[derive(Debug)]
struct PageAnalysis {
    extraction: Extraction,
    next: Option<String>,
    articles: Vec<String>,
}

#[derive(Debug)]
enum WalkState {
    Fetching(String),
    Extracting(PageFetch),
    Paginating { next: Option<String> },
    Done,
    Failed { url: String, error: AppError },
}

/// Result of crawling one target.
#[derive(Debug, Default)]
pub struct CrawlSummary {
    pub pages: usize,
    pub articles: usize,
    pub failed: bool,
    pub records: Vec<ClassifiedRecord>,
}

/// Walks blog pagination and feeds pages to a visitor.
pub struct PaginationCrawler {
    fetcher: Arc<LinkVerifier>,
    page_delay: Duration,
    article_delay: Duration,
    delay_after_last_page: bool,
    max_pages: usize,
}

impl PaginationCrawler {
    pub fn new(fetcher: Arc<LinkVerifier>, config: &CrawlerConfig) -> Self {
        Self {
            fetcher,
            page_delay: config.page_delay(),
            article_delay: config.article_delay(),
            delay_after_last_page: config.delay_after_last_page,
            max_pages: config.max_pages,
        }
    }

    /// Crawl one target to completion.
    ///
    /// Fetch failures end the walk but never propagate: whatever was
    /// visited before the failure is kept.
    pub async fn crawl(&self, target: &Target, visitor: &dyn PageVisitor) -> CrawlSummary {
        let mut summary = CrawlSummary::default();
        let mut articles: Vec<String> = Vec::new();
        let mut seen_articles: HashSet<String> = HashSet::new();
        let mut state = WalkState::Fetching(target.url.clone());

        loop {
            state = match state {
                WalkState::Fetching(url) => {
                    if self.max_pages > 0 && summary.pages >= self.max_pages {
                        log::warn!("Page cap {} reached for {}", self.max_pages, target.url);
                        WalkState::Done
                    } else {
                        log::debug!("Fetching page {url}");
                        match self.fetcher.fetch_page(&url).await {
                            Ok(page) => {
                                summary.pages += 1;
                                WalkState::Extracting(page)
                            }
                            Err(error) => WalkState::Failed { url, error },
                        }
                    }
                }
                WalkState::Extracting(page) => {
                    let analysis = analyse_page(&page, target.platform);
                    if target.platform.lists_articles() {
                        for article in analysis.articles {
                            if seen_articles.insert(article.clone()) {
                                articles.push(article);
                            }
                        }
                    } else {
                        let records = visitor.visit(target, &page.url, analysis.extraction).await;
                        summary.records.extend(records);
                    }
                    WalkState::Paginating {
                        next: analysis.next,
                    }
                }
                WalkState::Paginating { next: Some(next) } => {
                    pause(self.page_delay).await;
                    WalkState::Fetching(next)
                }
                WalkState::Paginating { next: None } => {
                    if self.delay_after_last_page {
                        pause(self.page_delay).await;
                    }
                    WalkState::Done
                }
                WalkState::Done => break,
                WalkState::Failed { url, error } => {
                    log::error!("Stopping crawl of {}: failed to fetch {url}: {error}", target.url);
                    summary.failed = true;
                    break;
                }
            };
        }

        if !articles.is_empty() {
            log::info!("Found {} articles on {}", articles.len(), target.url);
        }
        for article in articles {
            pause(self.article_delay).await;
            match self.fetcher.fetch_page(&article).await {
                Ok(page) => {
                    summary.articles += 1;
                    let extraction = extract_ad_links(&page.body, &page.url);
                    let records = visitor.visit(target, &page.url, extraction).await;
                    summary.records.extend(records);
                }
                Err(e) => log::warn!("Skipping article {article}: {e}"),
            }
        }

        summary
    }
}

fn analyse_page(page: &PageFetch, platform: Platform) -> PageAnalysis {
    let Ok(base) = Url::parse(&page.url) else {
        log::warn!("Cannot analyse page with invalid URL: {}", page.url);
        return PageAnalysis {
            extraction: Extraction::NotApplicable,
            next: None,
            articles: Vec::new(),
        };
    };

    let document = Html::parse_document(&page.body);
    let extraction = if platform.lists_articles() {
        Extraction::NotApplicable
    } else {
        extract_from_document(&document, &base)
    };
    PageAnalysis {
        extraction,
        next: platform.next_page(&document, &base),
        articles: platform.article_links(&document, &base),
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
