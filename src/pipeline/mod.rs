//! Pipeline entry points for link check runs.
//!
//! - `run_checks`: Crawl targets and classify every checked link
//! - `run_pipeline`: Full run including report, diff and notifications

pub mod classify;
pub mod context;
pub mod diff;
pub mod report;
pub mod run;

pub use classify::{CheckContext, PRESENT_EMPTY_REASON, PlatformEscape, Policy};
pub use context::RunContext;
pub use diff::{DiffResult, diff_failures};
pub use report::{REPORT_COLUMNS, Report, ReportSummary};
pub use run::{RunOutcome, run_checks, run_pipeline};
