// src/models/mod.rs

//! Domain models for the link checker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod manifest;
mod outcome;
mod record;
mod target;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, NotifyConfig, OutputConfig, PlatformEscapeConfig, PolicyConfig,
    RefreshRetry, VerifierConfig,
};
pub use manifest::{AutoTarget, Manifest, ManualEntry, PreviousFailure};
pub use outcome::{CheckOutcome, OutcomeKind, REDIRECT_LIMIT_MESSAGE};
pub use record::{CheckResult, ClassifiedRecord, FailureKey};
pub use target::{ExtractedLink, PageFetch, Target};
