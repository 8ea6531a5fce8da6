//! Aggregate operation reporting
//!
//! Backup, restore, and teardown all visit many independent items
//! (containers or databases). A failure on one item is recovered at that
//! item's boundary and recorded here; it never aborts its siblings.
//!
//! Outcomes are keyed by item identity in an ordered map, so the report
//! is identical however a concurrent run interleaves completions.
//!
//! Exit-status mapping: `0` when every item succeeded, `2` when at least
//! one item failed but the rest completed. `1` is reserved for
//! configuration or connectivity failures that stop the invocation
//! before any per-item work (mapped in the CLI layer, not here).

use std::collections::BTreeMap;

use crate::observability::Logger;

/// Process exit status: total success.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit status: the invocation could not start.
pub const EXIT_FATAL: i32 = 1;
/// Process exit status: one or more per-item failures.
pub const EXIT_PARTIAL: i32 = 2;

/// The outcome of one independent unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Succeeded,
    Failed(String),
    /// The overall deadline expired before this item was started.
    TimedOut,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded)
    }
}

/// Per-item outcomes for one orchestrated operation.
#[derive(Debug, Default)]
pub struct OperationReport {
    outcomes: BTreeMap<String, ItemOutcome>,
}

impl OperationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, item: impl Into<String>, outcome: ItemOutcome) {
        self.outcomes.insert(item.into(), outcome);
    }

    pub fn outcome(&self, item: &str) -> Option<&ItemOutcome> {
        self.outcomes.get(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ItemOutcome)> {
        self.outcomes.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when no item failed (an empty report is clean).
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_clean() {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL
        }
    }

    /// Emit the final summary line for the operation.
    pub fn log_summary(&self, operation: &str) {
        let succeeded = self.succeeded().to_string();
        let failed = self.failed().to_string();
        let total = self.outcomes.len().to_string();
        let fields = [
            ("operation", operation),
            ("total", total.as_str()),
            ("succeeded", succeeded.as_str()),
            ("failed", failed.as_str()),
        ];
        if self.is_clean() {
            Logger::info("summary", &fields);
        } else {
            Logger::error("summary", &fields);
        }
    }
}
