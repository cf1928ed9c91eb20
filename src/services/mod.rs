//! Service layer for the link checker.
//!
//! This module contains the business logic for:
//! - Platform detection and pagination rules (`Platform`)
//! - Ad-disclosure link extraction (`extract_ad_links`)
//! - HTTP link verification (`LinkVerifier`)
//! - Bounded concurrent checking (`CheckScheduler`)
//! - Paginated blog walking (`PaginationCrawler`)

mod crawler;
pub mod extractor;
mod platform;
mod scheduler;
mod verifier;

pub use crawler::{CrawlSummary, PageVisitor, PaginationCrawler};
pub use extractor::{DISCLOSURE_MARKER, Extraction, extract_ad_links};
pub use platform::Platform;
pub use scheduler::{CheckScheduler, LinkProbe};
pub use verifier::{LinkVerifier, find_meta_refresh};
