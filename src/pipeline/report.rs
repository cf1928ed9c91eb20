// src/pipeline/report.rs

//! Report assembly and encoding.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::ClassifiedRecord;

/// Column names of the CSV report, in order.
pub const REPORT_COLUMNS: [&str; 8] = [
    "blog_url",
    "page_url",
    "checked_link",
    "status",
    "status_code",
    "final_url",
    "error_message",
    "timestamp",
];

/// Row counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub ok: usize,
    pub ng: usize,
}

/// Sorted report rows of one run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    records: Vec<ClassifiedRecord>,
}

impl Report {
    /// Sort rows by origin, page and checked link. Ties keep input order.
    pub fn new(mut records: Vec<ClassifiedRecord>) -> Self {
        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { records }
    }

    pub fn records(&self) -> &[ClassifiedRecord] {
        &self.records
    }

    pub fn summary(&self) -> ReportSummary {
        let ng = self.records.iter().filter(|r| r.is_ng()).count();
        ReportSummary {
            total: self.records.len(),
            ok: self.records.len() - ng,
            ng,
        }
    }

    /// Encode as CSV. The header row is written even for an empty report.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(REPORT_COLUMNS)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckResult;
    use chrono::{TimeZone, Utc};

    fn row(origin: &str, page: &str, link: &str, result: CheckResult) -> ClassifiedRecord {
        ClassifiedRecord {
            origin: origin.into(),
            page_url: page.into(),
            checked_link: link.into(),
            result,
            status_code: (result == CheckResult::Ok).then_some(200),
            final_url: link.into(),
            reason: (result == CheckResult::Ng).then(|| "status code 500".to_string()),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_sorted_by_origin_page_link() {
        let report = Report::new(vec![
            row("b", "p1", "l1", CheckResult::Ok),
            row("a", "p2", "l1", CheckResult::Ok),
            row("a", "p1", "l2", CheckResult::Ng),
            row("a", "p1", "l1", CheckResult::Ok),
        ]);
        let keys: Vec<_> = report.records().iter().map(|r| r.sort_key()).collect();
        assert_eq!(
            keys,
            vec![("a", "p1", "l1"), ("a", "p1", "l2"), ("a", "p2", "l1"), ("b", "p1", "l1")]
        );
    }

    #[test]
    fn test_summary_counts() {
        let report = Report::new(vec![
            row("a", "p", "1", CheckResult::Ok),
            row("a", "p", "2", CheckResult::Ng),
            row("a", "p", "3", CheckResult::Ng),
        ]);
        assert_eq!(report.summary(), ReportSummary { total: 3, ok: 1, ng: 2 });
    }

    #[test]
    fn test_empty_report_has_header() {
        let csv = String::from_utf8(Report::default().to_csv().unwrap()).unwrap();
        assert_eq!(
            csv,
            "blog_url,page_url,checked_link,status,status_code,final_url,error_message,timestamp\n"
        );
    }

    #[test]
    fn test_csv_rows() {
        let report = Report::new(vec![
            row("a", "p", "https://x.example/", CheckResult::Ng),
            row("a", "p", "https://y.example/", CheckResult::Ok),
        ]);
        let csv = String::from_utf8(report.to_csv().unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "a,p,https://x.example/,NG,,https://x.example/,status code 500,2024-05-01T09:30:00Z"
        );
        assert_eq!(
            lines[2],
            "a,p,https://y.example/,OK,200,https://y.example/,,2024-05-01T09:30:00Z"
        );
    }
}
