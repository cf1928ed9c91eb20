//! Downstream workflow trigger.

use serde::Serialize;

use crate::error::{AppError, Result};

/// Body POSTed to the workflow endpoint after a run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WorkflowPayload {
    pub report_location: String,
    pub total: usize,
    pub ng: usize,
    pub new: usize,
    pub fixed: usize,
}

/// Starts a follow-up workflow with a JSON POST.
pub struct WorkflowTrigger {
    url: String,
    http: reqwest::Client,
}

impl WorkflowTrigger {
    pub fn new(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    pub async fn trigger(&self, payload: &WorkflowPayload) -> Result<()> {
        let resp = self.http.post(&self.url).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::notify(format!("workflow trigger returned {status}")));
        }
        log::info!("Triggered workflow at {}", self.url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_posts_counts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/run")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "report_location": "s3://out/results/linkcheck_result.csv",
                "total": 10,
                "ng": 2,
                "new": 1,
                "fixed": 0,
            })))
            .with_status(202)
            .create_async()
            .await;

        let trigger = WorkflowTrigger::new(format!("{}/run", server.url()), reqwest::Client::new());
        trigger
            .trigger(&WorkflowPayload {
                report_location: "s3://out/results/linkcheck_result.csv".into(),
                total: 10,
                ng: 2,
                new: 1,
                fixed: 0,
            })
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
