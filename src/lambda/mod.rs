// src/lambda/mod.rs

//! AWS Lambda handler for the link checker.
//!
//! This module provides the Lambda function entry point that:
//! 1. Loads configuration from the environment
//! 2. Reads the manifest named by the triggering S3 event
//! 3. Runs one full check
//! 4. Writes the report and artifacts to the output bucket

use std::time::Instant;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::config_from_env;
use crate::error::{AppError, Result};
use crate::notify::Notifications;
use crate::pipeline::{RunContext, RunOutcome, run_pipeline};
use crate::storage::{S3Storage, read_manifest};

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct RunResponse {
    /// Whether the run completed and the report was written
    pub success: bool,

    /// Human-readable result or error
    pub message: String,

    pub total: usize,
    pub ok: usize,
    pub ng: usize,
    pub new_failures: usize,
    pub fixed_failures: usize,

    /// Where the report was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_location: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl From<&RunOutcome> for RunResponse {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            success: true,
            message: format!(
                "checked {} links: {} NG ({} new, {} fixed)",
                outcome.summary.total,
                outcome.summary.ng,
                outcome.diff.new.len(),
                outcome.diff.fixed.len()
            ),
            total: outcome.summary.total,
            ok: outcome.summary.ok,
            ng: outcome.summary.ng,
            new_failures: outcome.diff.new.len(),
            fixed_failures: outcome.diff.fixed.len(),
            report_location: Some(outcome.report_location.clone()),
            execution_time_ms: 0,
        }
    }
}

/// Bucket and key of the manifest that triggered the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLocation {
    pub bucket: String,
    pub key: String,
}

/// Extract the manifest location from an S3 event notification.
///
/// Object keys arrive form-urlencoded and are decoded here.
pub fn manifest_location(payload: &Value) -> Result<ManifestLocation> {
    let record = payload
        .get("Records")
        .and_then(|records| records.get(0))
        .ok_or_else(|| AppError::manifest("no S3 record found in event"))?;

    let bucket = record.pointer("/s3/bucket/name").and_then(Value::as_str);
    let key = record.pointer("/s3/object/key").and_then(Value::as_str);
    let (Some(bucket), Some(key)) = (bucket, key) else {
        return Err(AppError::manifest(
            "S3 record is missing the bucket name or object key",
        ));
    };

    Ok(ManifestLocation {
        bucket: bucket.to_string(),
        key: decode_key(key),
    })
}

fn decode_key(raw: &str) -> String {
    let query = format!("k={raw}");
    url::form_urlencoded::parse(query.as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| raw.to_string())
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<RunResponse, LambdaError> {
    let start = Instant::now();
    let (payload, _context) = event.into_parts();

    match run(&payload).await {
        Ok(outcome) => {
            let mut response = RunResponse::from(&outcome);
            response.execution_time_ms = start.elapsed().as_millis() as u64;
            info!(
                "Link check completed: {} total, {} NG in {}ms",
                response.total, response.ng, response.execution_time_ms
            );
            Ok(response)
        }
        Err(e) => {
            error!("Link check failed: {}", e);
            Ok(RunResponse {
                success: false,
                message: e.to_string(),
                execution_time_ms: start.elapsed().as_millis() as u64,
                ..Default::default()
            })
        }
    }
}

/// Internal run logic.
async fn run(payload: &Value) -> Result<RunOutcome> {
    // Configuration and trigger are checked before any network activity
    let config = config_from_env()?;
    let location = manifest_location(payload)?;
    info!(
        "Manifest: s3://{}/{}, output bucket: {}",
        location.bucket, location.key, config.output.bucket
    );
    let ctx = RunContext::new(config)?;

    let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_s3::Client::new(&aws);
    let input = S3Storage::new(client.clone(), location.bucket);
    let output = S3Storage::new(client, ctx.config.output.bucket.clone());

    let manifest = read_manifest(&input, &location.key).await?;
    let notifications = Notifications::from_config(&ctx.config.notify, ctx.http.clone());
    run_pipeline(&ctx, &manifest, &output, &notifications).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s3_event(bucket: &str, key: &str) -> Value {
        json!({
            "Records": [{
                "eventSource": "aws:s3",
                "s3": {
                    "bucket": {"name": bucket},
                    "object": {"key": key, "size": 512}
                }
            }]
        })
    }

    #[test]
    fn test_manifest_location() {
        let location = manifest_location(&s3_event("input-bucket", "manifests/run.json")).unwrap();
        assert_eq!(
            location,
            ManifestLocation {
                bucket: "input-bucket".into(),
                key: "manifests/run.json".into(),
            }
        );
    }

    #[test]
    fn test_key_is_url_decoded() {
        let location =
            manifest_location(&s3_event("b", "manifests/2024+05%2F%E3%83%86.json")).unwrap();
        assert_eq!(location.key, "manifests/2024 05/テ.json");
    }

    #[test]
    fn test_missing_records() {
        let err = manifest_location(&json!({"Records": []})).unwrap_err();
        assert!(err.to_string().contains("no S3 record found in event"));
        assert!(manifest_location(&json!({})).is_err());
    }

    #[test]
    fn test_incomplete_record() {
        let event = json!({"Records": [{"s3": {"bucket": {"name": "b"}}}]});
        assert!(matches!(
            manifest_location(&event),
            Err(AppError::Manifest(_))
        ));
    }

    #[test]
    fn test_response_serialization() {
        let response = RunResponse {
            success: false,
            message: "boom".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "boom");
        assert!(value.get("report_location").is_none());
    }
}
