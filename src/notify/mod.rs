//! Best-effort run notifications.
//!
//! A chat summary goes through a [`NotifyBackend`]; downstream workflows
//! are started with a JSON POST. Neither can fail a run.

mod slack;
mod workflow;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NotifyConfig;
use crate::pipeline::{DiffResult, ReportSummary};

pub use slack::SlackWebhook;
pub use workflow::{WorkflowPayload, WorkflowTrigger};

/// Maximum diff entries listed per section of a summary.
const MAX_LISTED: usize = 20;

/// Pluggable chat notification backend.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Backend used when no webhook is configured.
pub struct NoopBackend;

#[async_trait]
impl NotifyBackend for NoopBackend {
    async fn send(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Notification endpoints of one run.
pub struct Notifications {
    pub summary: Box<dyn NotifyBackend>,
    pub workflow: Option<WorkflowTrigger>,
}

impl Notifications {
    pub fn from_config(config: &NotifyConfig, http: reqwest::Client) -> Self {
        let summary: Box<dyn NotifyBackend> = match non_empty(&config.webhook_url) {
            Some(url) => Box::new(SlackWebhook::new(url, http.clone())),
            None => Box::new(NoopBackend),
        };
        Self {
            summary,
            workflow: non_empty(&config.workflow_url).map(|url| WorkflowTrigger::new(url, http)),
        }
    }

    /// No summary backend and no workflow trigger.
    pub fn disabled() -> Self {
        Self {
            summary: Box::new(NoopBackend),
            workflow: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Render the chat summary of a finished run.
pub fn render_summary(summary: &ReportSummary, diff: &DiffResult, report_location: &str) -> String {
    let mut lines = vec![
        ":mag: *Ad link check complete*".to_string(),
        format!(
            "Checked {} links: {} OK / {} NG",
            summary.total, summary.ok, summary.ng
        ),
        format!("Report: {report_location}"),
    ];

    if !diff.has_changes() {
        lines.push("_No change in failures since the previous run_".to_string());
        return lines.join("\n");
    }

    if !diff.new.is_empty() {
        lines.push(format!("*New NG ({}):*", diff.new.len()));
        for record in diff.new.iter().take(MAX_LISTED) {
            lines.push(format!(
                "  - {} -> {}: {}",
                record.page_url,
                record.checked_link,
                record.reason.as_deref().unwrap_or("-")
            ));
        }
        if diff.new.len() > MAX_LISTED {
            lines.push(format!("  ... and {} more", diff.new.len() - MAX_LISTED));
        }
    }

    if !diff.fixed.is_empty() {
        lines.push(format!("*Fixed ({}):*", diff.fixed.len()));
        for failure in diff.fixed.iter().take(MAX_LISTED) {
            lines.push(format!("  - {} -> {}", failure.page_url, failure.checked_link));
        }
        if diff.fixed.len() > MAX_LISTED {
            lines.push(format!("  ... and {} more", diff.fixed.len() - MAX_LISTED));
        }
    }

    lines.join("\n")
}
