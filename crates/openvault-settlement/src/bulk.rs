//! Structured results for admin bulk decisions.
//!
//! A bulk action applies one decision to many requests independently; one
//! request's failure never aborts the rest. The report carries a per-item
//! outcome plus aggregate counts; callers render their own messages from
//! it.

use serde::{Deserialize, Serialize};

use openvault_types::RequestId;

/// Outcome of one request inside a bulk decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkItemOutcome {
    /// The decision was applied.
    Applied,
    /// Benign race: the request had already left PENDING. Counted, never
    /// surfaced as a failure.
    AlreadyProcessed,
    /// The decision failed for this request; the error's display form.
    Failed { error: String },
}

/// One line of a bulk report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    pub request_id: RequestId,
    pub outcome: BulkItemOutcome,
}

/// Per-item outcomes of a bulk decision, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    pub items: Vec<BulkItem>,
}

impl BulkReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, request_id: RequestId, outcome: BulkItemOutcome) {
        self.items.push(BulkItem {
            request_id,
            outcome,
        });
    }

    /// Requests the decision was applied to.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, BulkItemOutcome::Applied))
    }

    /// Requests that had already been processed (benign races).
    #[must_use]
    pub fn already_processed(&self) -> usize {
        self.count(|o| matches!(o, BulkItemOutcome::AlreadyProcessed))
    }

    /// Requests that failed outright.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BulkItemOutcome::Failed { .. }))
    }

    /// Whether every request was applied cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.applied() == self.items.len()
    }

    fn count(&self, pred: impl Fn(&BulkItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }
}
