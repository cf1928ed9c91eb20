//! AWS Lambda entry point for the link checker
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! Triggered by S3 notifications for uploaded manifests.

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use link_checker::lambda::handler;

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Link checker Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}
