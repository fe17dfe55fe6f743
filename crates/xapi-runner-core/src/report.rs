//! Aggregation of per-device outcomes into a run report.

use serde::Serialize;

use crate::model::{ExecutionOutcome, OutcomeStatus};

/// Ordered outcomes of a run plus their derived counts.
///
/// Counts are computed once from the outcome sequence and cannot drift from
/// it; there is no way to push outcomes into an existing report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    total: usize,
    succeeded: usize,
    failed: usize,
    outcomes: Vec<ExecutionOutcome>,
}

impl ExecutionReport {
    /// Build a report from outcomes in resolution order.
    #[must_use]
    pub fn aggregate(outcomes: Vec<ExecutionOutcome>) -> Self {
        let succeeded = outcomes
            .iter()
            .filter(|outcome| outcome.status == OutcomeStatus::Succeeded)
            .count();
        let total = outcomes.len();
        Self {
            total,
            succeeded,
            failed: total - succeeded,
            outcomes,
        }
    }

    /// Number of devices the command was attempted on.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Number of successful outcomes.
    #[must_use]
    pub const fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of failed outcomes.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// Outcomes in resolution order.
    #[must_use]
    pub fn outcomes(&self) -> &[ExecutionOutcome] {
        &self.outcomes
    }

    /// True when no outcome failed. An empty report counts as success.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl FromIterator<ExecutionOutcome> for ExecutionReport {
    fn from_iter<I: IntoIterator<Item = ExecutionOutcome>>(iter: I) -> Self {
        Self::aggregate(iter.into_iter().collect())
    }
}
