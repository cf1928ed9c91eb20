// src/pipeline/run.rs

//! End-to-end run: crawl, check, classify, report, diff, notify.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::error::Result;
use crate::models::{ClassifiedRecord, Manifest, ManualEntry, Target};
use crate::notify::{Notifications, WorkflowPayload, render_summary};
use crate::pipeline::{CheckContext, DiffResult, Report, ReportSummary, RunContext, diff_failures};
use crate::services::{Extraction, PageVisitor, Platform};
use crate::storage::{CSV_CONTENT_TYPE, ReportStorage, write_json};
use crate::utils;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    pub summary: ReportSummary,
    pub diff: DiffResult,
    pub report_location: String,
}

/// Checks the ad links of every crawled page.
struct CrawlVisitor<'a> {
    ctx: &'a RunContext,
}

impl CrawlVisitor<'_> {
    fn is_excluded(&self, candidate: &str) -> bool {
        self.ctx
            .config
            .policy
            .exclude_patterns
            .iter()
            .any(|p| !p.is_empty() && candidate.contains(p.as_str()))
    }
}

#[async_trait]
impl PageVisitor for CrawlVisitor<'_> {
    async fn visit(
        &self,
        target: &Target,
        page_url: &str,
        extraction: Extraction,
    ) -> Vec<ClassifiedRecord> {
        let links = match extraction {
            Extraction::NotApplicable => return Vec::new(),
            Extraction::PresentEmpty => {
                log::warn!("Disclosure marker without a link on {page_url}");
                let context = CheckContext {
                    origin: &target.url,
                    origin_url: &target.url,
                    page_url,
                };
                return vec![self.ctx.policy.present_empty(context, Utc::now())];
            }
            Extraction::Links(links) => links,
        };

        let found = links.len();
        let candidates: Vec<String> = links
            .into_iter()
            .map(|l| l.candidate)
            .filter(|c| !self.is_excluded(c))
            .collect();
        log::info!(
            "{page_url}: {found} ad links, {} after exclusions",
            candidates.len()
        );
        if candidates.is_empty() {
            return Vec::new();
        }

        let outcomes = self.ctx.scheduler.check_all(candidates).await;
        let now = Utc::now();
        let context = CheckContext {
            origin: &target.url,
            origin_url: &target.url,
            page_url,
        };
        outcomes
            .iter()
            .map(|outcome| self.ctx.policy.record(outcome, context, now))
            .collect()
    }
}

/// Crawl every auto target and check every manual entry.
///
/// Per-target and per-link failures become log lines or NG rows; this
/// never fails as a whole.
pub async fn run_checks(ctx: &RunContext, manifest: &Manifest) -> Vec<ClassifiedRecord> {
    let visitor = CrawlVisitor { ctx };
    let mut records = Vec::new();

    for url in manifest.auto_urls() {
        let Some(target) = Target::detect(url) else {
            log::warn!("Skipping unsupported URL: {url}");
            continue;
        };
        if target.platform == Platform::Generic && !ctx.config.crawler.crawl_generic {
            log::warn!("Skipping {url}: not a Hatena or Livedoor blog");
            continue;
        }

        utils::log::sub_item(&format!("Crawling {} ({})", target.url, target.platform));
        let summary = ctx.crawler.crawl(&target, &visitor).await;
        log::info!(
            "Finished {}: {} pages, {} articles, {} rows{}",
            target.url,
            summary.pages,
            summary.articles,
            summary.records.len(),
            if summary.failed { " (stopped early)" } else { "" }
        );
        records.extend(summary.records);
    }

    records.extend(check_manual_entries(ctx, &manifest.manual_url_list).await);
    records
}

async fn check_manual_entries(ctx: &RunContext, entries: &[ManualEntry]) -> Vec<ClassifiedRecord> {
    let complete: Vec<&ManualEntry> = entries
        .iter()
        .filter(|e| {
            let ok = e.is_complete();
            if !ok {
                log::warn!("Skipping incomplete manual entry: {e:?}");
            }
            ok
        })
        .collect();
    if complete.is_empty() {
        return Vec::new();
    }

    utils::log::sub_item(&format!("Checking {} manual links", complete.len()));
    let urls = complete
        .iter()
        .map(|e| e.affiliate_link.trim().to_string())
        .collect();
    let outcomes = ctx.scheduler.check_all(urls).await;

    let now = Utc::now();
    complete
        .iter()
        .zip(&outcomes)
        .map(|(entry, outcome)| {
            let page_url = entry.blog_article_url.trim();
            let context = CheckContext {
                origin: &entry.spreadsheet_link,
                origin_url: page_url,
                page_url,
            };
            ctx.policy.record(outcome, context, now)
        })
        .collect()
}

/// Run one full check and write its artifacts.
///
/// Only a failure to write the primary report fails the run. The diff,
/// the status flag and notifications are best-effort.
pub async fn run_pipeline(
    ctx: &RunContext,
    manifest: &Manifest,
    storage: &dyn ReportStorage,
    notifications: &Notifications,
) -> Result<RunOutcome> {
    let output = &ctx.config.output;
    utils::log::header("Ad link check");

    utils::log::step(1, 4, "Check - Crawling blogs and verifying links");
    let records = run_checks(ctx, manifest).await;

    utils::log::step(2, 4, "Report - Writing results");
    let report = Report::new(records);
    let summary = report.summary();
    let diff = diff_failures(report.records(), &manifest.previous_error_details);
    storage
        .write_bytes(&output.report_key, report.to_csv()?, CSV_CONTENT_TYPE)
        .await?;
    let report_location = storage.location(&output.report_key);
    log::info!("Report written to {report_location}");

    utils::log::step(3, 4, "Diff - Recording changes since the previous run");
    log::info!(
        "{} changes since the previous run: {} new NG, {} fixed",
        diff.change_count(),
        diff.new.len(),
        diff.fixed.len()
    );
    if let Err(e) = write_json(storage, &output.diff_key, &diff).await {
        log::error!("Failed to write diff: {e}");
    }
    let status = json!({ "last_success_at": Utc::now().to_rfc3339() });
    if let Err(e) = write_json(storage, &output.status_key, &status).await {
        log::error!("Failed to write completion status: {e}");
    }

    utils::log::step(4, 4, "Notify - Sending summary");
    if let Some(workflow) = &notifications.workflow {
        let payload = WorkflowPayload {
            report_location: report_location.clone(),
            total: summary.total,
            ng: summary.ng,
            new: diff.new.len(),
            fixed: diff.fixed.len(),
        };
        if let Err(e) = workflow.trigger(&payload).await {
            log::error!("Failed to trigger workflow: {e}");
        }
    }
    let text = render_summary(&summary, &diff, &report_location);
    if let Err(e) = notifications.summary.send(&text).await {
        log::error!("Failed to send summary notification: {e}");
    }

    utils::log::summary(
        "Ad link check",
        &[
            ("Total", summary.total.to_string()),
            ("OK", summary.ok.to_string()),
            ("NG", summary.ng.to_string()),
            ("New NG", diff.new.len().to_string()),
            ("Fixed", diff.fixed.len().to_string()),
        ],
    );

    Ok(RunOutcome {
        report,
        summary,
        diff,
        report_location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckOutcome, CheckResult, Config, ExtractedLink, OutcomeKind};
    use crate::services::LinkProbe;
    use crate::storage::LocalStorage;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Succeeds for every link except those containing "broken".
    struct StubProbe;

    #[async_trait]
    impl LinkProbe for StubProbe {
        async fn check(&self, url: &str) -> CheckOutcome {
            let kind = if url.contains("broken") {
                OutcomeKind::HttpError {
                    status: 404,
                    final_url: url.to_string(),
                    message: format!("404 Not Found for url: {url}"),
                }
            } else {
                OutcomeKind::Success {
                    status: 200,
                    final_url: url.to_string(),
                    keyword_hit: None,
                }
            };
            CheckOutcome::new(url, kind)
        }
    }

    fn context() -> RunContext {
        RunContext::with_probe(Config::default(), Arc::new(StubProbe)).unwrap()
    }

    fn manual(label: &str, page: &str, link: &str) -> ManualEntry {
        ManualEntry {
            spreadsheet_link: label.into(),
            blog_article_url: page.into(),
            affiliate_link: link.into(),
        }
    }

    #[tokio::test]
    async fn test_manual_entries_are_checked() {
        let ctx = context();
        let manifest = Manifest {
            manual_url_list: vec![
                manual("sheet", "https://foo.hatenablog.com/entry/1", "https://shop.example/ok"),
                manual("sheet", "https://foo.hatenablog.com/entry/2", "https://shop.example/broken"),
                manual("sheet", "", "https://shop.example/skipped"),
            ],
            ..Manifest::default()
        };

        let records = run_checks(&ctx, &manifest).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].result, CheckResult::Ok);
        assert_eq!(records[0].origin, "sheet");
        assert_eq!(records[0].page_url, "https://foo.hatenablog.com/entry/1");
        assert_eq!(records[1].result, CheckResult::Ng);
        assert_eq!(records[1].status_code, Some(404));
    }

    #[tokio::test]
    async fn test_excluded_candidates_are_not_checked() {
        let mut config = Config::default();
        config.policy.exclude_patterns = vec!["amazon.co.jp".into(), String::new()];
        let ctx = RunContext::with_probe(config, Arc::new(StubProbe)).unwrap();
        let visitor = CrawlVisitor { ctx: &ctx };
        let page = "https://foo.hatenablog.com/entry/1";
        let links = ["https://www.amazon.co.jp/dp/X", "https://shop.example/broken"]
            .into_iter()
            .map(|candidate| ExtractedLink {
                source_page: page.into(),
                candidate: candidate.into(),
            })
            .collect();
        let target = Target::with_platform("https://foo.hatenablog.com/", Platform::Hatena);

        let records = visitor.visit(&target, page, Extraction::Links(links)).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].checked_link, "https://shop.example/broken");
        assert_eq!(records[0].origin, "https://foo.hatenablog.com/");
        assert_eq!(records[0].result, CheckResult::Ng);
    }

    #[tokio::test]
    async fn test_only_excluded_candidates_yield_no_rows() {
        let mut config = Config::default();
        config.policy.exclude_patterns = vec!["rakuten".into()];
        let ctx = RunContext::with_probe(config, Arc::new(StubProbe)).unwrap();
        let visitor = CrawlVisitor { ctx: &ctx };
        let page = "https://foo.hatenablog.com/entry/2";
        let links = vec![ExtractedLink {
            source_page: page.into(),
            candidate: "https://item.rakuten.co.jp/x".into(),
        }];
        let target = Target::with_platform("https://foo.hatenablog.com/", Platform::Hatena);

        assert!(
            visitor
                .visit(&target, page, Extraction::Links(links))
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_generic_and_hostless_targets_are_skipped() {
        let ctx = context();
        let manifest: Manifest = serde_json::from_value(serde_json::json!({
            "auto_url_list": [
                {"url": "https://example.com/blog"},
                {"url": "not a url"},
                {"url": ""},
                {}
            ]
        }))
        .unwrap();

        assert!(run_checks(&ctx, &manifest).await.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_writes_artifacts() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let ctx = context();
        let manifest: Manifest = serde_json::from_value(serde_json::json!({
            "manual_url_list": [
                {"spreadsheet_link": "sheet", "blog_article_url": "https://a.hatenablog.com/entry/1", "affiliate_link": "https://shop.example/broken"}
            ],
            "previous_error_details": [
                {"blog_url": "sheet", "page_url": "https://a.hatenablog.com/entry/9", "checked_link": "https://shop.example/old", "error_reason": "404"}
            ]
        }))
        .unwrap();

        let outcome = run_pipeline(&ctx, &manifest, &storage, &Notifications::disabled())
            .await
            .unwrap();

        assert_eq!(outcome.summary.ng, 1);
        assert_eq!(outcome.diff.new.len(), 1);
        assert_eq!(outcome.diff.fixed.len(), 1);

        let output = &ctx.config.output;
        let csv = std::fs::read_to_string(tmp.path().join(&output.report_key)).unwrap();
        assert!(csv.starts_with("blog_url,page_url,checked_link,status,"));
        assert_eq!(csv.lines().count(), 2);

        let diff: serde_json::Value =
            serde_json::from_slice(&std::fs::read(tmp.path().join(&output.diff_key)).unwrap())
                .unwrap();
        assert_eq!(diff["new"].as_array().unwrap().len(), 1);
        assert_eq!(diff["fixed"][0]["checked_link"], "https://shop.example/old");

        let status: serde_json::Value =
            serde_json::from_slice(&std::fs::read(tmp.path().join(&output.status_key)).unwrap())
                .unwrap();
        assert!(status["last_success_at"].is_string());
    }
}
