//! Differential failure tracking between runs.
//!
//! Compares the NG rows of this run against the NG rows reported by the
//! previous run, keyed by page URL and checked link.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{ClassifiedRecord, FailureKey, PreviousFailure};

/// Failures that appeared or disappeared since the previous run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// NG now, not NG last time
    pub new: Vec<ClassifiedRecord>,
    /// NG last time, not NG now
    pub fixed: Vec<PreviousFailure>,
}

impl DiffResult {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.new.is_empty() || !self.fixed.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.new.len() + self.fixed.len()
    }
}

/// Set difference of current NG rows and previous failures by key.
///
/// OK rows in `current` are ignored. Both sides are sorted by key.
pub fn diff_failures(current: &[ClassifiedRecord], previous: &[PreviousFailure]) -> DiffResult {
    let current_ng: Vec<&ClassifiedRecord> = current.iter().filter(|r| r.is_ng()).collect();

    let current_keys: HashSet<FailureKey> = current_ng.iter().map(|r| r.failure_key()).collect();
    let previous_keys: HashSet<FailureKey> = previous.iter().map(|p| p.failure_key()).collect();

    // New: NG now, unknown before
    let mut new: Vec<ClassifiedRecord> = Vec::new();
    let mut emitted: HashSet<FailureKey> = HashSet::new();
    for record in current_ng {
        let key = record.failure_key();
        if !previous_keys.contains(&key) && emitted.insert(key) {
            new.push(record.clone());
        }
    }
    new.sort_by_key(|r| r.failure_key());

    // Fixed: NG before, not NG now
    let mut fixed: Vec<PreviousFailure> = Vec::new();
    let mut emitted: HashSet<FailureKey> = HashSet::new();
    for failure in previous {
        let key = failure.failure_key();
        if !current_keys.contains(&key) && emitted.insert(key) {
            fixed.push(failure.clone());
        }
    }
    fixed.sort_by_key(|f| f.failure_key());

    DiffResult { new, fixed }
}
