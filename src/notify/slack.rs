use async_trait::async_trait;
use serde_json::json;

use super::NotifyBackend;
use crate::error::{AppError, Result};

/// Slack incoming webhook notification backend.
pub struct SlackWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            http,
        }
    }
}

#[async_trait]
impl NotifyBackend for SlackWebhook {
    async fn send(&self, text: &str) -> Result<()> {
        let payload = json!({
            "text": text,
            "unfurl_links": false,
        });

        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            log::warn!("Slack webhook returned {status}: {body}");
            return Err(AppError::notify(format!("Slack webhook returned {status}")));
        }

        Ok(())
    }
}
