//! Storage abstractions for manifests and run artifacts.
//!
//! Every artifact is addressed by a relative key:
//!
//! ```text
//! {root or bucket}/
//! ├── results/
//! │   ├── linkcheck_result.csv   # Primary report
//! │   └── linkcheck_diff.json    # New / fixed failures
//! └── status/
//!     └── last_success.json      # Completion flag
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::Manifest;

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Content type of the CSV report.
pub const CSV_CONTENT_TYPE: &str = "text/csv";
/// Content type of JSON artifacts.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Key-addressed byte storage.
#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Read an object, returning `None` if it does not exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an object, replacing any previous content.
    async fn write_bytes(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Human-readable location of a key, for logs and responses.
    fn location(&self, key: &str) -> String;
}

/// Read and parse the manifest stored under `key`.
pub async fn read_manifest(storage: &dyn ReportStorage, key: &str) -> Result<Manifest> {
    let bytes = storage
        .read_bytes(key)
        .await?
        .ok_or_else(|| AppError::manifest(format!("manifest not found at {}", storage.location(key))))?;
    Manifest::from_slice(&bytes)
}

/// Serialize `value` as pretty JSON under `key`.
pub async fn write_json<T: Serialize + ?Sized + Sync>(
    storage: &dyn ReportStorage,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    storage.write_bytes(key, bytes, JSON_CONTENT_TYPE).await
}
